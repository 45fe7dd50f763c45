//! Instance routing
//!
//! Service-key extraction from target URLs plus affinity-then-random
//! selection over the eligible pool.

mod domain;
mod selector;

pub use domain::extract_service_key;
pub use selector::select;
