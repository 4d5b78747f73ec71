//! Sliding-window admission control per source.
//!
//! Each source gets an hourly share of its daily budget. Sources nearing
//! exhaustion are skipped by the orchestrator, never queued or blocked.
//! The tracker enforces the window invariant itself; callers only ask.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const WINDOW: Duration = Duration::from_secs(3600);

#[derive(Debug)]
pub struct QuotaTracker {
    inner: Mutex<HashMap<String, VecDeque<u64>>>,
    limits: HashMap<String, u32>,
    default_daily_limit: u32,
}

impl QuotaTracker {
    pub fn new(default_daily_limit: u32) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            limits: HashMap::new(),
            default_daily_limit,
        }
    }

    /// Override the daily limit for one source. Sources without an
    /// override use the default.
    pub fn with_limit(mut self, source_id: impl Into<String>, daily_limit: u32) -> Self {
        self.limits.insert(source_id.into(), daily_limit);
        self
    }

    /// Hourly share of the source's daily budget, at least one request.
    fn hourly_budget(&self, source_id: &str) -> usize {
        let daily = self
            .limits
            .get(source_id)
            .copied()
            .unwrap_or(self.default_daily_limit);
        ((daily / 24) as usize).max(1)
    }

    /// May this source be called right now? Prunes timestamps older than
    /// the window, then checks the hourly share.
    pub fn admit(&self, source_id: &str) -> bool {
        self.admit_at(source_id, now_unix())
    }

    /// Record an issued request. Call only after `admit` returned true and
    /// the request was actually sent.
    pub fn record(&self, source_id: &str) {
        self.record_at(source_id, now_unix());
    }

    /// Daily reset, invoked by an external scheduler.
    pub fn reset(&self) {
        self.inner.lock().expect("quota mutex poisoned").clear();
    }

    fn admit_at(&self, source_id: &str, now: u64) -> bool {
        let cutoff = now.saturating_sub(WINDOW.as_secs());
        let mut inner = self.inner.lock().expect("quota mutex poisoned");
        let window = inner.entry(source_id.to_string()).or_default();

        while let Some(&ts) = window.front() {
            if ts <= cutoff {
                window.pop_front();
            } else {
                break;
            }
        }

        window.len() < self.hourly_budget(source_id)
    }

    fn record_at(&self, source_id: &str, now: u64) {
        let mut inner = self.inner.lock().expect("quota mutex poisoned");
        inner.entry(source_id.to_string()).or_default().push_back(now);
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}
