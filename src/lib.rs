//! Switchyard - load-balancing gateway for federated download workers
//!
//! Switchyard sits in front of a pool of worker instances advertised by a
//! public directory service and routes client download requests to a
//! suitable worker. A two-phase "initiate then fetch" flow is pinned to the
//! same worker by rewriting download locators into same-origin tunnel paths.
//!
//! ## Services
//!
//! - **Directory**: per-request fetch of the worker list, filtered to
//!   eligible instances (online, no challenge, compatible version)
//! - **Routing**: service-key affinity matching with uniform-random fallback
//! - **Proxy**: phase-1 request forwarding with locator rewriting, phase-2
//!   tunnel resolution streaming the pinned worker's response

pub mod config;
pub mod directory;
pub mod proxy;
pub mod routes;
pub mod routing;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
