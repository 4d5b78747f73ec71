//! Result-set cache keyed by normalized query. An explicit dependency of
//! the orchestrator so in-memory and distributed implementations are
//! interchangeable. Writes are best-effort: a failed put is logged by the
//! caller and never fails the request.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::listing::ScoredListing;

#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Returns the cached listings, or None on miss or TTL expiry.
    async fn get(&self, key: &str) -> Option<Vec<ScoredListing>>;

    async fn put(&self, key: String, listings: Vec<ScoredListing>) -> Result<(), AppError>;

    async fn clear(&self);
}

struct CacheEntry {
    listings: Vec<ScoredListing>,
    created_at: Instant,
}

pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl InMemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl ResultCache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<ScoredListing>> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                Some(entry.listings.clone())
            }
            Some(_) => {
                // Expired entries are misses and eligible for eviction.
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: String, listings: Vec<ScoredListing>) -> Result<(), AppError> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key,
            CacheEntry {
                listings,
                created_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::{NormalizedListing, RawListing};
    use std::collections::BTreeSet;

    fn listing() -> ScoredListing {
        ScoredListing {
            listing: NormalizedListing {
                raw: RawListing {
                    title: "Engineer".into(),
                    company_name: "Acme".into(),
                    location: "Pune".into(),
                    description: String::new(),
                    apply_url: String::new(),
                    posted_at: None,
                    salary_text: None,
                    source_id: "test".into(),
                },
                skills: BTreeSet::new(),
                salary: None,
                remote: false,
                fingerprint: "fp".into(),
            },
            match_percentage: 50,
        }
    }

    #[tokio::test]
    async fn hit_within_ttl() {
        let cache = InMemoryCache::new(Duration::from_secs(60));
        cache.put("k".into(), vec![listing()]).await.unwrap();
        let got = cache.get("k").await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].match_percentage, 50);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = InMemoryCache::new(Duration::from_millis(10));
        cache.put("k".into(), vec![listing()]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn clear_evicts_everything() {
        let cache = InMemoryCache::new(Duration::from_secs(60));
        cache.put("k".into(), vec![listing()]).await.unwrap();
        cache.clear().await;
        assert!(cache.get("k").await.is_none());
    }
}
