use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobscout", about = "Multi-source job aggregation engine")]
pub struct Config {
    /// Database connection URL (persisted-fallback store)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    /// Listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Cache TTL for consolidated result sets, in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "21600")]
    pub cache_ttl_secs: u64,

    /// Per-source fetch timeout, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "30")]
    pub fetch_timeout_secs: u64,

    /// Overall aggregation deadline, in seconds. When exceeded, the
    /// orchestrator proceeds with whichever sources have already settled.
    #[arg(long, env = "REQUEST_DEADLINE_SECS", default_value = "45")]
    pub request_deadline_secs: u64,

    /// Default daily request budget per source; admission uses the
    /// hourly share
    #[arg(long, env = "SOURCE_DAILY_LIMIT", default_value = "240")]
    pub source_daily_limit: u32,

    /// Per-source budget overrides as comma-separated `source=limit`
    /// pairs, e.g. `remoteok=480,dice=120`
    #[arg(long, env = "SOURCE_DAILY_LIMITS", value_delimiter = ',', default_value = "")]
    pub source_daily_limits: Vec<String>,

    /// Run the O(n^2) fuzzy pass after exact-fingerprint dedup
    #[arg(long, env = "FUZZY_DEDUP", default_value = "false")]
    pub fuzzy_dedup: bool,

    /// Similarity threshold for the fuzzy pass, in [0,1]
    #[arg(long, env = "FUZZY_THRESHOLD", default_value = "0.85")]
    pub fuzzy_threshold: f64,

    /// Comma-separated source ids that win exact-duplicate collisions,
    /// highest priority first. Unlisted sources fall back to first-seen.
    #[arg(long, env = "PREFERRED_SOURCES", value_delimiter = ',', default_value = "")]
    pub preferred_sources: Vec<String>,
}
