use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One posting as returned by a source adapter, before normalization.
/// Immutable once produced; ordering across adapters is not meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub description: String,
    pub apply_url: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub salary_text: Option<String>,
    /// Id of the adapter that produced this listing.
    pub source_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Yearly,
    Monthly,
    Hourly,
}

/// Structured salary parsed from a listing's free-form salary text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub currency: String,
    pub period: SalaryPeriod,
}

/// RawListing enriched by the orchestrator: extracted skills, parsed
/// salary, remote flag, and the dedup fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedListing {
    #[serde(flatten)]
    pub raw: RawListing,
    pub skills: BTreeSet<String>,
    pub salary: Option<Salary>,
    pub remote: bool,
    pub fingerprint: String,
}

/// Terminal representation: a normalized listing with its skill-match
/// score attached. Returned to callers and written to cache/storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: NormalizedListing,
    pub match_percentage: u8,
}

/// Inbound search shape, consumed from the HTTP layer.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub skills: Vec<String>,
    pub location: String,
    #[serde(default)]
    pub remote: Option<bool>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub salary_min: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchMetadata {
    pub sources_used: Vec<String>,
    pub duplicates_removed: usize,
    pub cache_used: bool,
    pub fetch_time_ms: u64,
    pub total_fetched: usize,
    pub final_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub jobs: Vec<ScoredListing>,
    pub metadata: SearchMetadata,
}
