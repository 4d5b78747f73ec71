// Aggregation engine: cache check, quota-gated parallel source fetch,
// fingerprint dedup, skill-match scoring, best-effort cache/persist writes.

pub mod cache;
pub mod fingerprint;
pub mod matcher;
pub mod quota;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::task::JoinSet;

use crate::error::{AppError, FetchError};
use crate::models::listing::{
    NormalizedListing, RawListing, ScoredListing, SearchMetadata, SearchQuery, SearchResponse,
};
use crate::models::store::ListingStore;
use crate::sources::JobSource;

use cache::ResultCache;
use fingerprint::DedupConfig;
use quota::QuotaTracker;

const CACHE_KEY_MAX_LEN: usize = 48;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-source fetch timeout.
    pub fetch_timeout: Duration,
    /// Overall deadline; on expiry the engine proceeds with whatever
    /// sources have already settled.
    pub request_deadline: Duration,
    pub dedup: DedupConfig,
}

pub struct Aggregator {
    sources: Vec<Arc<dyn JobSource>>,
    cache: Arc<dyn ResultCache>,
    quota: Arc<QuotaTracker>,
    store: Arc<dyn ListingStore>,
    cfg: EngineConfig,
    /// Last issue time per source, to honor each adapter's minimum delay.
    last_fetch: Mutex<HashMap<&'static str, Instant>>,
}

impl Aggregator {
    pub fn new(
        sources: Vec<Arc<dyn JobSource>>,
        cache: Arc<dyn ResultCache>,
        quota: Arc<QuotaTracker>,
        store: Arc<dyn ListingStore>,
        cfg: EngineConfig,
    ) -> Self {
        Self {
            sources,
            cache,
            quota,
            store,
            cfg,
            last_fetch: Mutex::new(HashMap::new()),
        }
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn cache(&self) -> &dyn ResultCache {
        self.cache.as_ref()
    }

    /// Run one aggregation request end to end.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResponse, AppError> {
        let started = Instant::now();
        let key = cache_key(&query);

        if let Some(jobs) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "serving from cache");
            let metadata = SearchMetadata {
                sources_used: distinct_sources(&jobs),
                duplicates_removed: 0,
                cache_used: true,
                fetch_time_ms: started.elapsed().as_millis() as u64,
                // Nothing was fetched this request.
                total_fetched: 0,
                final_count: jobs.len(),
            };
            return Ok(SearchResponse { jobs, metadata });
        }

        let (raw, sources_used) = self.fetch_all(&query).await;
        let total_fetched = raw.len();

        // Fallback only when zero sources succeeded. A source settling OK
        // with no matching listings is a legitimate empty result.
        if sources_used.is_empty() {
            return self.fallback(&query, started).await;
        }

        let normalized: Vec<NormalizedListing> =
            raw.into_iter().map(normalize).filter(|l| passes_filters(l, &query)).collect();

        let (deduped, duplicates_removed) = fingerprint::dedup(normalized, &self.cfg.dedup);

        let mut jobs = score_all(deduped, &query.skills);
        matcher::sort_listings(&mut jobs);

        // Fire-and-forget side effects: neither may block or fail the
        // response.
        let cache = Arc::clone(&self.cache);
        let cached_jobs = jobs.clone();
        let cache_key = key.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.put(cache_key, cached_jobs).await {
                tracing::warn!("cache write failed: {e}");
            }
        });

        let store = Arc::clone(&self.store);
        let persisted = jobs.clone();
        tokio::spawn(async move {
            if let Err(e) = store.save(&persisted).await {
                tracing::warn!("persist write failed: {e}");
            }
        });

        let metadata = SearchMetadata {
            sources_used,
            duplicates_removed,
            cache_used: false,
            fetch_time_ms: started.elapsed().as_millis() as u64,
            total_fetched,
            final_count: jobs.len(),
        };
        Ok(SearchResponse { jobs, metadata })
    }

    /// Issue all admissible fetches concurrently and wait for every one to
    /// settle (or the deadline). Partial failure is tolerated; a source's
    /// error never aborts its siblings.
    async fn fetch_all(&self, query: &SearchQuery) -> (Vec<RawListing>, Vec<String>) {
        let timeout = self.cfg.fetch_timeout;
        let deadline = tokio::time::Instant::now() + self.cfg.request_deadline;

        let mut set: JoinSet<(&'static str, Result<Vec<RawListing>, FetchError>)> = JoinSet::new();

        for source in &self.sources {
            let id = source.id();
            if !self.quota.admit(id) {
                tracing::info!(source = id, "skipped: hourly quota share exhausted");
                continue;
            }
            if !self.spacing_allows(id, source.min_delay()) {
                tracing::debug!(source = id, "skipped: minimum delay not elapsed");
                continue;
            }
            self.quota.record(id);

            let source = Arc::clone(source);
            let query = query.clone();
            set.spawn(async move {
                let result = match tokio::time::timeout(timeout, source.fetch(&query)).await {
                    Ok(r) => r,
                    Err(_) => Err(FetchError::Timeout(timeout.as_secs())),
                };
                (source.id(), result)
            });
        }

        let mut raw = Vec::new();
        let mut sources_used = Vec::new();

        loop {
            tokio::select! {
                next = set.join_next() => match next {
                    None => break,
                    Some(Ok((id, Ok(mut listings)))) => {
                        tracing::info!(source = id, count = listings.len(), "source fetch succeeded");
                        sources_used.push(id.to_string());
                        raw.append(&mut listings);
                    }
                    Some(Ok((id, Err(e)))) => {
                        tracing::warn!(source = id, error = %e, "source fetch failed");
                    }
                    Some(Err(e)) => {
                        tracing::warn!("source fetch task aborted: {e}");
                    }
                },
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!("aggregation deadline exceeded, proceeding with settled sources");
                    set.abort_all();
                    break;
                }
            }
        }

        (raw, sources_used)
    }

    /// Degraded path: serve the most recent persisted listings, re-scored.
    async fn fallback(
        &self,
        query: &SearchQuery,
        started: Instant,
    ) -> Result<SearchResponse, AppError> {
        tracing::warn!("all sources failed or denied, falling back to persisted listings");
        let stored = self
            .store
            .query_recent(&query.skills, &query.location)
            .await?;
        let total = stored.len();

        // Persisted rows go through the same query filters as fresh ones.
        let stored: Vec<NormalizedListing> = stored
            .into_iter()
            .filter(|l| passes_filters(l, query))
            .collect();

        if stored.is_empty() {
            return Err(AppError::NoJobsAvailable);
        }

        let mut jobs = score_all(stored, &query.skills);
        matcher::sort_listings(&mut jobs);

        let metadata = SearchMetadata {
            sources_used: distinct_sources(&jobs),
            duplicates_removed: 0,
            cache_used: false,
            fetch_time_ms: started.elapsed().as_millis() as u64,
            total_fetched: total,
            final_count: jobs.len(),
        };
        Ok(SearchResponse { jobs, metadata })
    }

    fn spacing_allows(&self, id: &'static str, min_delay: Duration) -> bool {
        let mut last = self.last_fetch.lock().expect("spacing mutex poisoned");
        if let Some(prev) = last.get(id)
            && prev.elapsed() < min_delay
        {
            return false;
        }
        last.insert(id, Instant::now());
        true
    }
}

/// Canonical cache key: order- and case-insensitive over the query's
/// semantic content, reduced to a bounded opaque string.
pub fn cache_key(query: &SearchQuery) -> String {
    let mut skills: Vec<String> = query.skills.iter().map(|s| s.to_lowercase()).collect();
    skills.sort();

    let remote_token = match query.remote {
        Some(true) => "remote",
        _ => "onsite",
    };
    let joined = format!(
        "{}|{}|{}",
        skills.join(","),
        query.location.to_lowercase(),
        remote_token
    );

    let mut encoded = BASE64.encode(joined.as_bytes());
    encoded.truncate(CACHE_KEY_MAX_LEN);
    encoded
}

/// Attach skills, salary, remote flag and fingerprint to a raw listing.
pub fn normalize(raw: RawListing) -> NormalizedListing {
    let skills = matcher::extract_skills(&raw.title, &raw.description);
    let salary = raw.salary_text.as_deref().and_then(matcher::parse_salary);
    let remote = matcher::is_remote(&raw.title, &raw.location);
    let fp = fingerprint::fingerprint(&raw);

    NormalizedListing {
        raw,
        skills,
        salary,
        remote,
        fingerprint: fp,
    }
}

fn passes_filters(listing: &NormalizedListing, query: &SearchQuery) -> bool {
    if query.remote == Some(true) && !listing.remote {
        return false;
    }
    if let (Some(wanted_min), Some(salary)) = (query.salary_min, &listing.salary) {
        // Listings without parsed salary are kept; only a known-lower
        // salary is filtered out.
        let best = salary.max.or(salary.min);
        if let Some(best) = best
            && best < wanted_min
        {
            return false;
        }
    }
    true
}

fn score_all(listings: Vec<NormalizedListing>, candidate_skills: &[String]) -> Vec<ScoredListing> {
    listings
        .into_iter()
        .map(|listing| {
            let match_percentage = matcher::score(candidate_skills, &listing.skills);
            ScoredListing {
                listing,
                match_percentage,
            }
        })
        .collect()
}

fn distinct_sources(jobs: &[ScoredListing]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for job in jobs {
        if !sources.contains(&job.listing.raw.source_id) {
            sources.push(job.listing.raw.source_id.clone());
        }
    }
    sources
}
