//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each inbound request
//! is handled independently - there is no cross-request shared mutable
//! state, so the accept loop just clones the state handle per connection.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Args;
use crate::directory::{Directory, HttpDirectory};
use crate::proxy::{self, HttpUpstream, Upstream};
use crate::routes;
use crate::types::{BoxBody, GatewayError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Worker list source, fetched fresh per request
    pub directory: Arc<dyn Directory>,
    /// Worker-facing HTTP client
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    /// Create AppState with live HTTP clients
    pub fn new(args: Args) -> Result<Self> {
        let timeout = Duration::from_millis(args.request_timeout_ms);
        let directory = Arc::new(HttpDirectory::new(
            args.directory_url.clone(),
            &args.user_agent,
            timeout,
        )?);
        let upstream = Arc::new(HttpUpstream::new(
            &args.user_agent,
            timeout,
            Duration::from_millis(args.tunnel_connect_timeout_ms),
        )?);

        Ok(Self {
            args,
            directory,
            upstream,
        })
    }

    /// Create AppState with injected sources (tests)
    pub fn with_sources(
        args: Args,
        directory: Arc<dyn Directory>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            args,
            directory,
            upstream,
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Switchyard listening on {} as node {}",
        state.args.listen, state.args.node_id
    );
    info!("Directory: {}", state.args.directory_url);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // CORS preflight
        (Method::OPTIONS, _) => to_boxed(preflight_response()),

        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            to_boxed(routes::health_check(Arc::clone(&state)))
        }

        // Service metadata from the current eligible pool
        (Method::GET, "/") => {
            let origin = request_origin(req.headers());
            to_boxed(routes::service_info(Arc::clone(&state), &origin).await)
        }

        // Phase 1: forward a download request to a selected worker
        (Method::POST, "/") => {
            let body = match req.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    return Ok(to_boxed(
                        GatewayError::InvalidBody(e.to_string()).to_response(),
                    ));
                }
            };

            match proxy::forward_download(state.directory.as_ref(), state.upstream.as_ref(), body)
                .await
            {
                Ok(resp) => to_boxed(resp),
                Err(e) => to_boxed(e.to_response()),
            }
        }

        // Phase 2: resolve a pinned worker identity and stream its response
        (Method::GET, p) if p.starts_with("/tunnel/") => {
            let query = req.uri().query();
            match parse_tunnel_path(p) {
                Some((protocol, host)) => {
                    match proxy::resolve_tunnel(
                        state.directory.as_ref(),
                        state.upstream.as_ref(),
                        protocol,
                        host,
                        query,
                    )
                    .await
                    {
                        Ok(resp) => resp,
                        Err(e) => to_boxed(e.to_response()),
                    }
                }
                None => to_boxed(bad_request_response(
                    "Tunnel path must be /tunnel/{protocol}/{host}",
                )),
            }
        }

        // Not found
        _ => to_boxed(not_found_response(&path)),
    };

    Ok(response)
}

/// Extract `(protocol, host)` from a `/tunnel/{protocol}/{host}` path
fn parse_tunnel_path(path: &str) -> Option<(&str, &str)> {
    let remainder = path.strip_prefix("/tunnel/")?;
    let (protocol, host) = remainder.split_once('/')?;

    if protocol.is_empty() || host.is_empty() || host.contains('/') {
        return None;
    }

    Some((protocol, host))
}

/// Origin of this gateway as the client sees it
///
/// A reverse proxy in front of the gateway reports the client-facing
/// scheme in X-Forwarded-Proto; without it, fall back to a host-based
/// heuristic (loopback hosts are plain http in practice).
fn request_origin(headers: &hyper::HeaderMap) -> String {
    let host = headers
        .get("host")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");

    let scheme = match headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
    {
        Some(proto) if !proto.is_empty() => proto,
        _ => {
            if host.contains("localhost") || host.starts_with("127.") {
                "http"
            } else {
                "https"
            }
        }
    };

    format!("{}://{}", scheme, host)
}

/// Convert a Full<Bytes> body to BoxBody
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed_unsync())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

/// Bad request response
fn bad_request_response(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Bad Request",
        "message": message,
    });

    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tunnel_path() {
        assert_eq!(
            parse_tunnel_path("/tunnel/https/worker.example"),
            Some(("https", "worker.example"))
        );
        assert_eq!(
            parse_tunnel_path("/tunnel/http/worker.example:9000"),
            Some(("http", "worker.example:9000"))
        );
    }

    #[test]
    fn test_parse_tunnel_path_rejects_malformed() {
        assert_eq!(parse_tunnel_path("/tunnel/https"), None);
        assert_eq!(parse_tunnel_path("/tunnel//host"), None);
        assert_eq!(parse_tunnel_path("/tunnel/https/"), None);
        assert_eq!(parse_tunnel_path("/tunnel/https/host/extra"), None);
    }

    fn headers(pairs: &[(&str, &str)]) -> hyper::HeaderMap {
        let mut map = hyper::HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                hyper::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_request_origin_honors_forwarded_proto() {
        // A TLS-terminating proxy in front of a plain-HTTP gateway
        assert_eq!(
            request_origin(&headers(&[
                ("host", "gw.example"),
                ("x-forwarded-proto", "https")
            ])),
            "https://gw.example"
        );
        // And the reverse: plain-HTTP deployment behind no TLS
        assert_eq!(
            request_origin(&headers(&[
                ("host", "gw.internal"),
                ("x-forwarded-proto", "http")
            ])),
            "http://gw.internal"
        );
    }

    #[test]
    fn test_request_origin_heuristic_without_forwarded_proto() {
        assert_eq!(
            request_origin(&headers(&[("host", "gw.example")])),
            "https://gw.example"
        );
        assert_eq!(
            request_origin(&headers(&[("host", "localhost:8080")])),
            "http://localhost:8080"
        );
        assert_eq!(
            request_origin(&headers(&[("host", "127.0.0.1:8080")])),
            "http://127.0.0.1:8080"
        );
    }
}
