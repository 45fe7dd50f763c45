//! Directory client
//!
//! One HTTP GET against the directory endpoint per invocation, no caching
//! and no retry. A transport failure or non-2xx reply is fatal to the
//! request that triggered the fetch; the caller has no fallback.
//!
//! The trait seam exists so tests can substitute fixture pools for the
//! network fetch.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::directory::types::{eligible, Instance};
use crate::types::{GatewayError, Result};

/// Source of the current worker instance list
#[async_trait]
pub trait Directory: Send + Sync {
    /// Fetch the raw instance list from the directory
    async fn fetch(&self) -> Result<Vec<Instance>>;

    /// Fetch and reduce to the eligible pool
    ///
    /// The pool is a fresh snapshot; two calls may observe different sets
    /// as workers churn, which phase-2 resolution must tolerate.
    async fn eligible_pool(&self) -> Result<Vec<Instance>> {
        let all = self.fetch().await?;
        let pool = eligible(all);
        debug!(pool_size = pool.len(), "Eligible pool fetched");
        Ok(pool)
    }
}

/// HTTP-backed directory client
pub struct HttpDirectory {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDirectory {
    /// Build a client against the given directory endpoint
    ///
    /// The timeout bounds the whole fetch, including body read.
    pub fn new(endpoint: String, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(GatewayError::DirectoryUnavailable)?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn fetch(&self) -> Result<Vec<Instance>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(GatewayError::DirectoryUnavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::DirectoryStatus(
                hyper::StatusCode::from_u16(status.as_u16())
                    .unwrap_or(hyper::StatusCode::BAD_GATEWAY),
            ));
        }

        response
            .json::<Vec<Instance>>()
            .await
            .map_err(GatewayError::DirectoryDecode)
    }
}
