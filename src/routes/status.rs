//! Service metadata endpoint (GET /)
//!
//! Reports the pool's latest worker version, the gateway's own origin as
//! seen by the client, the advertised duration limit, and the union of
//! service keys any eligible worker supports. Frontends use this to decide
//! what they can offer before issuing a download request.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::directory::Instance;
use crate::server::AppState;
use crate::types::GatewayError;

/// Top-level metadata payload
#[derive(Serialize)]
struct InfoResponse {
    switchyard: ServiceBlock,
    git: GitBlock,
}

#[derive(Serialize)]
struct ServiceBlock {
    version: String,
    url: String,
    #[serde(rename = "startTime")]
    start_time: i64,
    #[serde(rename = "durationLimit")]
    duration_limit: u64,
    services: Vec<String>,
}

/// Build info for deployment verification
#[derive(Serialize)]
struct GitBlock {
    branch: &'static str,
    commit: &'static str,
    remote: &'static str,
}

/// Latest advertised version plus the union of supported service keys
///
/// "Latest" is the lexicographic max. That ordering is only correct while
/// all advertised versions keep equal digit-group widths, which holds for
/// the "10.x.y" generation this gateway accepts.
fn aggregate(pool: &[Instance]) -> (String, Vec<String>) {
    let latest = pool
        .iter()
        .map(|i| i.version.as_str())
        .max()
        .unwrap_or("")
        .to_string();

    let services: BTreeSet<&str> = pool
        .iter()
        .flat_map(|i| {
            i.services
                .iter()
                .filter(|(_, supported)| **supported)
                .map(|(key, _)| key.as_str())
        })
        .collect();

    (latest, services.into_iter().map(String::from).collect())
}

/// Handle GET / - service metadata from a fresh eligible pool
pub async fn service_info(state: Arc<AppState>, origin: &str) -> Response<Full<Bytes>> {
    let pool = match state.directory.eligible_pool().await {
        Ok(pool) if !pool.is_empty() => pool,
        Ok(_) => return GatewayError::NoEligibleInstances.to_response(),
        Err(e) => return e.to_response(),
    };

    let (version, services) = aggregate(&pool);

    let response = InfoResponse {
        switchyard: ServiceBlock {
            version,
            url: origin.to_string(),
            start_time: chrono::Utc::now().timestamp_millis(),
            duration_limit: state.args.duration_limit,
            services,
        },
        git: GitBlock {
            branch: option_env!("GIT_BRANCH").unwrap_or("unknown"),
            commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            remote: "switchyard",
        },
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"error": "Serialization failed"}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
