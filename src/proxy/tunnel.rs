//! Phase-2 tunnel resolution
//!
//! The tunnel locator issued in phase 1 encodes the pinned worker's
//! `(protocol, host)` identity. Resolution re-fetches the directory -
//! the phase-1 snapshot is gone, and worker churn means the instance may
//! no longer exist - and performs an exact identity lookup, never a
//! capability-based reselection. A miss is the component's single expected
//! failure mode and surfaces as a dedicated 404. On a hit, the worker's
//! response body is streamed through without buffering.

use hyper::Response;
use tracing::{debug, info};

use crate::directory::{Directory, Instance};
use crate::proxy::upstream::Upstream;
use crate::types::{BoxBody, GatewayError, Result};

/// Exact identity lookup over the current pool
pub fn find_instance<'p>(
    pool: &'p [Instance],
    protocol: &str,
    host: &str,
) -> Option<&'p Instance> {
    pool.iter()
        .find(|i| i.protocol == protocol && i.host == host)
}

/// Worker-side URL for a tunnel fetch
pub fn tunnel_target(instance: &Instance, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{}/tunnel?{}", instance.base_url(), q),
        _ => format!("{}/tunnel", instance.base_url()),
    }
}

/// Resolve a tunnel locator and stream the pinned worker's response
pub async fn resolve_tunnel(
    directory: &dyn Directory,
    upstream: &dyn Upstream,
    protocol: &str,
    host: &str,
    query: Option<&str>,
) -> Result<Response<BoxBody>> {
    let pool = directory.eligible_pool().await?;

    let Some(instance) = find_instance(&pool, protocol, host) else {
        info!(%protocol, %host, "Tunnel identity not in current pool");
        return Err(GatewayError::InstanceNotFound);
    };

    let target = tunnel_target(instance, query);
    debug!(url = %target, "Streaming tunnel response from worker");

    let stream = upstream.fetch_stream(&target).await?;

    Ok(Response::builder()
        .status(stream.status)
        .header("Content-Disposition", stream.content_disposition.as_str())
        .header("Access-Control-Allow-Origin", "*")
        .header("X-Instance", instance.host.as_str())
        .body(stream.body)
        .unwrap())
}
