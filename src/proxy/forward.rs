//! Phase-1 request forwarding
//!
//! The client's JSON body goes unmodified to the chosen worker. When the
//! worker's reply carries a follow-up download locator (`url` field), it is
//! rewritten into a same-origin tunnel path that encodes the worker's
//! identity plus the original query string, so the follow-up fetch can be
//! pinned back to the same worker without exposing its address. The
//! worker's status code passes through verbatim; worker-side 4xx/5xx are
//! never retried against a different instance.

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use tracing::{debug, warn};
use url::Url;

use crate::directory::{Directory, Instance};
use crate::proxy::upstream::Upstream;
use crate::routing::{extract_service_key, select};
use crate::types::{GatewayError, Result};

/// Build the same-origin tunnel locator for a pinned worker
///
/// Returns `None` when the original locator cannot be parsed.
pub fn tunnel_locator(instance: &Instance, original: &str) -> Option<String> {
    let parsed = Url::parse(original).ok()?;
    let path = format!("/tunnel/{}/{}", instance.protocol, instance.host);

    Some(match parsed.query() {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path,
    })
}

/// Rewrite a worker reply's download locator in place
///
/// An unparseable locator is dropped rather than passed through: the
/// tunnel path exists to keep the worker's real address out of client
/// responses, so the raw URL must never reach the client. Returns whether
/// a tunnel locator was installed.
pub fn rewrite_locator(payload: &mut serde_json::Value, instance: &Instance) -> bool {
    let Some(original) = payload.get("url").and_then(|v| v.as_str()) else {
        return false;
    };

    match tunnel_locator(instance, original) {
        Some(locator) => {
            payload["url"] = serde_json::Value::String(locator);
            true
        }
        None => {
            warn!(host = %instance.host, "Worker returned unparseable locator, dropping it");
            if let Some(object) = payload.as_object_mut() {
                object.remove("url");
            }
            false
        }
    }
}

/// Handle a phase-1 download request end to end
///
/// Fetches a fresh eligible pool, selects a worker by service-key affinity
/// (uniform-random fallback), forwards the body, and rewrites any locator
/// in the reply. Directory failure aborts before any worker call.
pub async fn forward_download(
    directory: &dyn Directory,
    upstream: &dyn Upstream,
    body: Bytes,
) -> Result<Response<Full<Bytes>>> {
    let request: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::InvalidBody(e.to_string()))?;

    // Extraction failure downgrades selection to random, never fails the
    // request
    let service_key = match request.get("url").and_then(|v| v.as_str()) {
        Some(target) => match extract_service_key(target) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Service-key extraction failed, selecting at random");
                None
            }
        },
        None => None,
    };

    let pool = directory.eligible_pool().await?;

    let chosen = {
        let mut rng = rand::thread_rng();
        select(&pool, service_key.as_deref(), &mut rng).cloned()
    }
    .ok_or(GatewayError::NoEligibleInstances)?;

    debug!(
        host = %chosen.host,
        service_key = ?service_key,
        pool_size = pool.len(),
        "Forwarding request to worker"
    );

    let (status, mut payload) = upstream.post_json(&chosen.base_url(), body).await?;

    rewrite_locator(&mut payload, &chosen);

    let json = serde_json::to_string(&payload)
        .unwrap_or_else(|_| r#"{"error": "Worker response serialization failed"}"#.to_string());

    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("X-Instance", chosen.host.as_str())
        .body(Full::new(Bytes::from(json)))
        .unwrap())
}
