use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cache of the rendered public index feed, keyed by page number.
///
/// Entries expire after a TTL, and every post mutation calls
/// [`Cache::invalidate`], so a write is visible on the next request even
/// inside the TTL window. Only anonymous renders go through it: a
/// logged-in page embeds the session header and is never cached.
pub struct Cache {
    ttl: Duration,
    pages: RwLock<HashMap<i32, CachedPage>>,
}

struct CachedPage {
    rendered_at: Instant,
    body: Vec<u8>,
}

impl Cache {
    pub fn new(ttl: Duration) -> Cache {
        Cache {
            ttl,
            pages: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, page: i32) -> Option<Vec<u8>> {
        let pages = self.pages.read().unwrap();
        pages
            .get(&page)
            .filter(|cached| cached.rendered_at.elapsed() < self.ttl)
            .map(|cached| cached.body.clone())
    }

    pub fn insert(&self, page: i32, body: Vec<u8>) {
        let mut pages = self.pages.write().unwrap();
        pages.insert(
            page,
            CachedPage {
                rendered_at: Instant::now(),
                body,
            },
        );
    }

    /// Drops every cached page. Called whenever a post or comment is
    /// created or edited.
    pub fn invalidate(&self) {
        self.pages.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn serves_within_ttl() {
        let cache = Cache::new(Duration::from_secs(20));
        cache.insert(1, b"first render".to_vec());
        // still served even if the underlying data changed meanwhile
        assert_eq!(cache.get(1), Some(b"first render".to_vec()));
        assert_eq!(cache.get(2), None);
    }

    #[test]
    fn expires_after_ttl() {
        let cache = Cache::new(Duration::from_millis(10));
        cache.insert(1, b"stale".to_vec());
        sleep(Duration::from_millis(20));
        assert_eq!(cache.get(1), None);
    }

    #[test]
    fn invalidate_clears_everything() {
        let cache = Cache::new(Duration::from_secs(20));
        cache.insert(1, b"page one".to_vec());
        cache.insert(2, b"page two".to_vec());
        cache.invalidate();
        assert_eq!(cache.get(1), None);
        assert_eq!(cache.get(2), None);

        // a fresh render can be cached again afterwards
        cache.insert(1, b"new render".to_vec());
        assert_eq!(cache.get(1), Some(b"new render".to_vec()));
    }
}
