//! Service-key derivation from target URLs
//!
//! The service key is a coarse string used purely as a lookup into an
//! instance's capability map. It is derived with a fixed two-step rule:
//! drop the last hostname label (assumed TLD), then drop the first label
//! if more than two remain (assumed subdomain). The result is whatever the
//! directory's capability maps use as keys - it is not a registrable
//! domain and is never validated. Multi-label TLDs (`.co.uk`) and hosts
//! with four or more labels therefore produce keys that look "wrong" but
//! match what workers advertise.

use url::Url;

/// Error cases for service-key extraction
///
/// Callers recover from these locally: a missing key downgrades selection
/// to uniform-random over the whole pool, it never fails the request.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ServiceKeyError {
    #[error("target URL unparseable: {0}")]
    Unparseable(String),
    #[error("target URL has no hostname")]
    NoHost,
}

/// Derive the service key for a target URL
pub fn extract_service_key(url_str: &str) -> Result<String, ServiceKeyError> {
    let url =
        Url::parse(url_str).map_err(|e| ServiceKeyError::Unparseable(e.to_string()))?;
    let host = url.host_str().ok_or(ServiceKeyError::NoHost)?;

    let mut labels: Vec<&str> = host.split('.').collect();

    // Drop the trailing TLD label
    labels.pop();
    // Drop the leading subdomain label when more than two remain
    if labels.len() > 2 {
        labels.remove(0);
    }

    Ok(labels.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_label_host_keeps_subdomain() {
        // Per the fixed rule: [www, youtube, com] -> drop last -> two
        // labels remain, no further drop
        assert_eq!(
            extract_service_key("https://www.youtube.com/watch?v=1").unwrap(),
            "www.youtube"
        );
    }

    #[test]
    fn test_two_label_host() {
        assert_eq!(
            extract_service_key("https://twitter.com/user/status/1").unwrap(),
            "twitter"
        );
    }

    #[test]
    fn test_deep_host_drops_one_of_each() {
        // Exactly one TLD label and one leading label are dropped,
        // independent of depth
        assert_eq!(
            extract_service_key("https://a.b.c.d.example.com/x").unwrap(),
            "b.c.d.example"
        );
    }

    #[test]
    fn test_multi_label_tld_is_not_special_cased() {
        // .co.uk gets the same treatment as any other suffix
        assert_eq!(
            extract_service_key("https://media.example.co.uk/v").unwrap(),
            "example.co"
        );
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            extract_service_key("not a url"),
            Err(ServiceKeyError::Unparseable(_))
        ));
    }

    #[test]
    fn test_url_without_host() {
        assert_eq!(
            extract_service_key("data:text/plain,hello"),
            Err(ServiceKeyError::NoHost)
        );
    }
}
