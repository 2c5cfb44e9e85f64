//! Remembers which endpoint last served each request path.
//!
//! Entries are only ever overwritten, never evicted. A cached endpoint that
//! starts failing stays cached until a region scan succeeds somewhere else.
use crate::metrics_defs::{ROUTE_CACHE_HIT, ROUTE_CACHE_MISS, ROUTE_CACHE_WRITE};
use parking_lot::RwLock;
use shared::counter;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RouteCache {
    routes: Arc<RwLock<HashMap<String, String>>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, path: &str) -> Option<String> {
        let endpoint = self.routes.read().get(path).cloned();
        let metric_def = match endpoint {
            Some(_) => ROUTE_CACHE_HIT,
            None => ROUTE_CACHE_MISS,
        };
        counter!(metric_def).increment(1);
        endpoint
    }

    /// Stores `endpoint` for `path`, replacing any previous entry.
    pub fn set(&self, path: &str, endpoint: &str) {
        self.routes
            .write()
            .insert(path.to_string(), endpoint.to_string());
        counter!(ROUTE_CACHE_WRITE).increment(1);
    }

    /// Stores `endpoint` for `path` only if the current entry is still
    /// `expected` (`None` meaning no entry). Returns whether it was written.
    pub fn replace_if(&self, path: &str, expected: Option<&str>, endpoint: &str) -> bool {
        let mut routes = self.routes.write();
        if routes.get(path).map(String::as_str) != expected {
            return false;
        }
        routes.insert(path.to_string(), endpoint.to_string());
        counter!(ROUTE_CACHE_WRITE).increment(1);
        true
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/namespaces/default/eventbus/p0qcb5te/events";

    #[test]
    fn test_lookup_and_overwrite() {
        let cache = RouteCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(PATH), None);

        cache.set(PATH, "http://a:8080");
        assert_eq!(cache.lookup(PATH).as_deref(), Some("http://a:8080"));

        cache.set(PATH, "http://b:8080");
        assert_eq!(cache.lookup(PATH).as_deref(), Some("http://b:8080"));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.lookup("/namespaces/default/eventbus/other/events"), None);
    }

    #[test]
    fn test_replace_if() {
        let cache = RouteCache::new();

        assert!(cache.replace_if(PATH, None, "http://a:8080"));
        assert!(!cache.replace_if(PATH, None, "http://b:8080"));
        assert!(!cache.replace_if(PATH, Some("http://b:8080"), "http://c:8080"));
        assert!(cache.replace_if(PATH, Some("http://a:8080"), "http://b:8080"));

        assert_eq!(cache.lookup(PATH).as_deref(), Some("http://b:8080"));
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = RouteCache::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for j in 0..500 {
                        let path = format!("/eventbus/{}/events", j % 50);
                        cache.set(&path, &format!("http://region-{i}:8080"));
                        assert!(cache.lookup(&path).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 50);
    }
}
