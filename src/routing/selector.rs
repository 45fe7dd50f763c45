//! Instance selection
//!
//! Two-step policy: prefer instances declaring the request's service key as
//! supported, otherwise fall back to a uniform pick over the whole pool. A
//! request is never rejected for lack of a perfectly matching worker -
//! affinity is a best-effort optimization, not a guarantee.
//!
//! Randomness is injected so tests can seed the source and assert exact
//! outcomes.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::directory::Instance;

/// Pick one instance from the pool
///
/// Returns `None` only when the pool is empty; callers surface that as an
/// explicit no-eligible-instances error rather than selecting from nothing.
pub fn select<'p, R: Rng + ?Sized>(
    pool: &'p [Instance],
    service_key: Option<&str>,
    rng: &mut R,
) -> Option<&'p Instance> {
    if let Some(key) = service_key {
        let candidates: Vec<&Instance> = pool.iter().filter(|i| i.supports(key)).collect();
        if let Some(&chosen) = candidates.choose(rng) {
            return Some(chosen);
        }
    }

    pool.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn make_instance(host: &str, services: &[(&str, bool)]) -> Instance {
        Instance {
            host: host.to_string(),
            protocol: "https".to_string(),
            services: services
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<HashMap<_, _>>(),
            version: "10.0".to_string(),
            online: true,
            turnstile: false,
            name: String::new(),
            score: 0.0,
        }
    }

    #[test]
    fn test_empty_pool_returns_none() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select(&[], Some("youtube"), &mut rng).is_none());
        assert!(select(&[], None, &mut rng).is_none());
    }

    #[test]
    fn test_affinity_always_wins_when_available() {
        let pool = vec![
            make_instance("plain.example", &[]),
            make_instance("yt.example", &[("www.youtube", true)]),
            make_instance("no.example", &[("www.youtube", false)]),
        ];

        // Any seed: the only declared supporter must be chosen every time
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = select(&pool, Some("www.youtube"), &mut rng).unwrap();
            assert_eq!(chosen.host, "yt.example");
        }
    }

    #[test]
    fn test_affinity_choice_stays_within_candidates() {
        let pool = vec![
            make_instance("a.example", &[("twitter", true)]),
            make_instance("b.example", &[("twitter", true)]),
            make_instance("c.example", &[]),
        ];

        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = select(&pool, Some("twitter"), &mut rng).unwrap();
            assert!(chosen.host == "a.example" || chosen.host == "b.example");
        }
    }

    #[test]
    fn test_fallback_support_equals_pool() {
        let pool = vec![
            make_instance("a.example", &[]),
            make_instance("b.example", &[]),
            make_instance("c.example", &[]),
        ];

        // No instance matches the key: support of the fallback pick must
        // cover the whole pool
        let mut seen = std::collections::HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = select(&pool, Some("unknown-key"), &mut rng).unwrap();
            seen.insert(chosen.host.clone());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_no_service_key_picks_from_pool() {
        let pool = vec![make_instance("only.example", &[("x", true)])];
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(select(&pool, None, &mut rng).unwrap().host, "only.example");
    }

    #[test]
    fn test_false_capability_is_not_a_match() {
        let pool = vec![
            make_instance("declines.example", &[("reddit", false)]),
            make_instance("other.example", &[]),
        ];

        // Nobody declares reddit=true, so fallback covers both
        let mut seen = std::collections::HashSet::new();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            seen.insert(select(&pool, Some("reddit"), &mut rng).unwrap().host.clone());
        }
        assert_eq!(seen.len(), 2);
    }
}
