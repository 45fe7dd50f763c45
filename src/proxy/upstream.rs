//! Worker-facing HTTP client
//!
//! Both worker call shapes sit behind a trait so tests can substitute
//! deterministic fixtures for real network calls. The reqwest-backed
//! implementation uses two clients: JSON calls carry a full request
//! timeout, the tunnel stream bounds only connection establishment so
//! large downloads are not cut off mid-body.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::StatusCode;
use std::time::Duration;

use crate::types::{BoxBody, GatewayError, Result};

/// Streamed worker response for the tunnel path
pub struct UpstreamStream {
    pub status: StatusCode,
    /// Worker's Content-Disposition, empty when absent
    pub content_disposition: String,
    pub body: BoxBody,
}

/// HTTP capability for talking to worker instances
#[async_trait]
pub trait Upstream: Send + Sync {
    /// POST a JSON body to a worker, returning its status and parsed reply
    async fn post_json(&self, url: &str, body: Bytes) -> Result<(StatusCode, serde_json::Value)>;

    /// GET a worker URL and hand back the response as a stream
    async fn fetch_stream(&self, url: &str) -> Result<UpstreamStream>;
}

/// reqwest-backed worker client
pub struct HttpUpstream {
    json_client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(
        user_agent: &str,
        request_timeout: Duration,
        stream_connect_timeout: Duration,
    ) -> Result<Self> {
        let json_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .build()
            .map_err(GatewayError::Upstream)?;

        let stream_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(stream_connect_timeout)
            .build()
            .map_err(GatewayError::Upstream)?;

        Ok(Self {
            json_client,
            stream_client,
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn post_json(&self, url: &str, body: Bytes) -> Result<(StatusCode, serde_json::Value)> {
        let response = self
            .json_client
            .post(url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(GatewayError::Upstream)?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(GatewayError::Upstream)?;

        Ok((status, payload))
    }

    async fn fetch_stream(&self, url: &str) -> Result<UpstreamStream> {
        let response = self
            .stream_client
            .get(url)
            .send()
            .await
            .map_err(GatewayError::Upstream)?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_disposition = response
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let stream = response
            .bytes_stream()
            .map_ok(Frame::data)
            .map_err(std::io::Error::other);

        Ok(UpstreamStream {
            status,
            content_disposition,
            body: StreamBody::new(stream).boxed_unsync(),
        })
    }
}
