use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use clap::Parser;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobscout::config::Config;
use jobscout::engine::cache::InMemoryCache;
use jobscout::engine::fingerprint::DedupConfig;
use jobscout::engine::quota::QuotaTracker;
use jobscout::engine::{Aggregator, EngineConfig};
use jobscout::models::store::PgListingStore;
use jobscout::{db, routes, sources};

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(pool: PgPool) -> impl IntoResponse {
    let result: Result<(i32,), _> = sqlx::query_as("SELECT 1").fetch_one(&pool).await;
    match result {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobscout=info,tower_http=info")),
        )
        .init();

    let config = Config::parse();

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
        tracing::info!("Migrations complete");
    }

    let engine_cfg = EngineConfig {
        fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        request_deadline: Duration::from_secs(config.request_deadline_secs),
        dedup: DedupConfig {
            preferred_sources: config
                .preferred_sources
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect(),
            fuzzy_pass: config.fuzzy_dedup,
            fuzzy_threshold: config.fuzzy_threshold,
        },
    };

    let mut quota = QuotaTracker::new(config.source_daily_limit);
    for pair in config.source_daily_limits.iter().filter(|p| !p.is_empty()) {
        match pair
            .split_once('=')
            .and_then(|(s, l)| l.parse::<u32>().ok().map(|l| (s.to_string(), l)))
        {
            Some((source, limit)) => quota = quota.with_limit(source, limit),
            None => tracing::warn!("Ignoring malformed source limit override '{pair}'"),
        }
    }

    let aggregator = Arc::new(Aggregator::new(
        sources::default_sources(),
        Arc::new(InMemoryCache::new(Duration::from_secs(config.cache_ttl_secs))),
        Arc::new(quota),
        Arc::new(PgListingStore::new(pool.clone())),
        engine_cfg,
    ));

    let readyz_pool = pool.clone();
    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(move || readyz(readyz_pool.clone())))
        .nest("/api/v1", routes::router(aggregator))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
