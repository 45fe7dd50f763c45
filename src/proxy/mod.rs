//! Request proxying
//!
//! Phase 1 forwards a client's download request to a selected worker and
//! rewrites any follow-up locator in the response into a same-origin tunnel
//! path pinning the worker's identity. Phase 2 resolves that identity
//! against a fresh pool and streams the pinned worker's response back.

mod forward;
mod tunnel;
mod upstream;

pub use forward::{forward_download, rewrite_locator, tunnel_locator};
pub use tunnel::{find_instance, resolve_tunnel, tunnel_target};
pub use upstream::{HttpUpstream, Upstream, UpstreamStream};
