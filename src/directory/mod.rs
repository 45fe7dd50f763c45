//! Directory service integration
//!
//! The directory is an external HTTP endpoint publishing the current list of
//! worker instances and their capabilities. It is fetched fresh on every
//! inbound request - the gateway keeps no instance cache of its own, so the
//! directory's freshness policy is the only cache in play.

mod client;
mod types;

pub use client::{Directory, HttpDirectory};
pub use types::{eligible, Instance};
