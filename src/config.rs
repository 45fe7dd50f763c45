//! Configuration for Switchyard
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Switchyard - load-balancing gateway for federated download workers
#[derive(Parser, Debug, Clone)]
#[command(name = "switchyard")]
#[command(about = "Routes download requests across a directory-advertised worker pool")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Directory endpoint publishing the worker instance list
    #[arg(
        long,
        env = "DIRECTORY_URL",
        default_value = "https://instances.hyper.lol/instances.json"
    )]
    pub directory_url: String,

    /// User-Agent sent on directory and worker requests
    #[arg(long, env = "USER_AGENT", default_value = "switchyard")]
    pub user_agent: String,

    /// Timeout in milliseconds for directory fetches and phase-1 worker calls
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Connect timeout in milliseconds for tunnel streaming
    ///
    /// Tunnel bodies can be large downloads, so only connection
    /// establishment is bounded; the read itself is not.
    #[arg(long, env = "TUNNEL_CONNECT_TIMEOUT_MS", default_value = "10000")]
    pub tunnel_connect_timeout_ms: u64,

    /// Maximum advertised media duration in seconds, reported on GET /
    #[arg(long, env = "DURATION_LIMIT", default_value = "10800")]
    pub duration_limit: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.directory_url.is_empty() {
            return Err("DIRECTORY_URL must not be empty".to_string());
        }
        if !self.directory_url.starts_with("http://") && !self.directory_url.starts_with("https://")
        {
            return Err(format!(
                "DIRECTORY_URL must be an http(s) URL, got: {}",
                self.directory_url
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }
        Ok(())
    }
}
