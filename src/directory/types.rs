//! Worker instance records as published by the directory
//!
//! Field names follow the directory's wire format. Only the fields the
//! eligibility filter reads are defaulted defensively; records missing them
//! simply fail the filter instead of failing deserialization.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version prefix accepted by the gateway
///
/// Instances on other protocol generations speak an incompatible API and
/// are filtered out regardless of their reported health.
pub const COMPATIBLE_VERSION_PREFIX: &str = "10";

/// A worker instance advertised by the directory
///
/// Immutable per request; `(protocol, host)` together form the instance's
/// identity for tunnel resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Host (and optional port) of the worker API
    #[serde(rename = "api")]
    pub host: String,

    /// URL scheme the worker is reachable on (`http` or `https`)
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Per-service-key capability map (service key -> can service it)
    #[serde(default)]
    pub services: HashMap<String, bool>,

    /// Ordered comparable version string
    #[serde(default)]
    pub version: String,

    /// Whether the directory reports the worker API as reachable
    #[serde(rename = "api_online", default)]
    pub online: bool,

    /// Whether the worker requires a challenge to be solved before use
    #[serde(default)]
    pub turnstile: bool,

    /// Operator-assigned instance name (informational)
    #[serde(default)]
    pub name: String,

    /// Directory-assigned health score (informational)
    #[serde(default)]
    pub score: f64,
}

fn default_protocol() -> String {
    "https".to_string()
}

impl Instance {
    /// Base address of the worker, e.g. `https://worker.example`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.host)
    }

    /// Whether this instance declares the given service key as supported
    pub fn supports(&self, service_key: &str) -> bool {
        self.services.get(service_key).copied().unwrap_or(false)
    }

    /// Whether this instance passes the eligibility filter
    pub fn is_eligible(&self) -> bool {
        self.online && !self.turnstile && self.version.starts_with(COMPATIBLE_VERSION_PREFIX)
    }
}

/// Filter a directory response down to the eligible pool
pub fn eligible(instances: Vec<Instance>) -> Vec<Instance> {
    instances.into_iter().filter(Instance::is_eligible).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_instance(host: &str, version: &str, online: bool, turnstile: bool) -> Instance {
        Instance {
            host: host.to_string(),
            protocol: "https".to_string(),
            services: HashMap::new(),
            version: version.to_string(),
            online,
            turnstile,
            name: String::new(),
            score: 0.0,
        }
    }

    #[test]
    fn test_eligibility_filter() {
        let pool = vec![
            make_instance("a.example", "10.4.2", true, false),
            make_instance("offline.example", "10.4.2", false, false),
            make_instance("challenge.example", "10.4.2", true, true),
            make_instance("old.example", "7.9", true, false),
        ];

        let filtered = eligible(pool);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].host, "a.example");
    }

    #[test]
    fn test_version_prefix_is_string_match() {
        // "100.x" also starts with "10" - the gate is a prefix match, not
        // a numeric comparison
        assert!(make_instance("x", "100.1", true, false).is_eligible());
        assert!(!make_instance("x", "9.10", true, false).is_eligible());
        assert!(!make_instance("x", "", true, false).is_eligible());
    }

    #[test]
    fn test_deserialize_defaults_missing_fields() {
        // Only `api` is required; filter-relevant fields default to
        // values that fail eligibility
        let inst: Instance = serde_json::from_str(r#"{"api": "bare.example"}"#).unwrap();
        assert_eq!(inst.host, "bare.example");
        assert_eq!(inst.protocol, "https");
        assert!(!inst.online);
        assert!(!inst.is_eligible());
    }

    #[test]
    fn test_deserialize_directory_record() {
        let json = r#"{
            "api": "worker.example",
            "protocol": "https",
            "api_online": true,
            "turnstile": false,
            "version": "10.4.2",
            "services": {"youtube": true, "twitter": false},
            "name": "worker-1",
            "score": 98.5,
            "trust": "safe",
            "frontEnd": "worker.example"
        }"#;

        let inst: Instance = serde_json::from_str(json).unwrap();
        assert!(inst.is_eligible());
        assert!(inst.supports("youtube"));
        assert!(!inst.supports("twitter"));
        assert!(!inst.supports("unknown"));
        assert_eq!(inst.base_url(), "https://worker.example");
    }
}
