use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::listing::{
    NormalizedListing, RawListing, Salary, SalaryPeriod, ScoredListing,
};

/// Durable store collaborator. Scored result sets are saved best-effort
/// after every successful aggregation; `query_recent` backs the
/// persisted-fallback path when no live source yields anything.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn save(&self, listings: &[ScoredListing]) -> Result<(), AppError>;

    /// Most recently seen listings matching any of the given skills and the
    /// location. Possibly stale; the orchestrator re-scores them.
    async fn query_recent(
        &self,
        skills: &[String],
        location: &str,
    ) -> Result<Vec<NormalizedListing>, AppError>;
}

pub struct PgListingStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    title: String,
    company_name: String,
    location: String,
    description: String,
    apply_url: String,
    posted_at: Option<DateTime<Utc>>,
    salary_text: Option<String>,
    source_id: String,
    skills: Vec<String>,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    salary_currency: Option<String>,
    salary_period: Option<String>,
    remote: bool,
    fingerprint: String,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn save(&self, listings: &[ScoredListing]) -> Result<(), AppError> {
        for scored in listings {
            let l = &scored.listing;
            let skills: Vec<String> = l.skills.iter().cloned().collect();
            let (salary_min, salary_max, salary_currency, salary_period) = match &l.salary {
                Some(s) => (
                    s.min,
                    s.max,
                    Some(s.currency.clone()),
                    Some(period_str(s.period).to_string()),
                ),
                None => (None, None, None, None),
            };

            sqlx::query(
                "INSERT INTO listings (fingerprint, title, company_name, location, description, apply_url, posted_at, salary_text, source_id, skills, salary_min, salary_max, salary_currency, salary_period, remote, seen_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW()) \
                 ON CONFLICT (fingerprint) DO UPDATE SET seen_at = NOW(), salary_text = EXCLUDED.salary_text, description = EXCLUDED.description",
            )
            .bind(&l.fingerprint)
            .bind(&l.raw.title)
            .bind(&l.raw.company_name)
            .bind(&l.raw.location)
            .bind(&l.raw.description)
            .bind(&l.raw.apply_url)
            .bind(l.raw.posted_at)
            .bind(&l.raw.salary_text)
            .bind(&l.raw.source_id)
            .bind(&skills)
            .bind(salary_min)
            .bind(salary_max)
            .bind(&salary_currency)
            .bind(&salary_period)
            .bind(l.remote)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn query_recent(
        &self,
        skills: &[String],
        location: &str,
    ) -> Result<Vec<NormalizedListing>, AppError> {
        let wanted: Vec<String> = skills.iter().map(|s| s.to_lowercase()).collect();
        let rows = sqlx::query_as::<_, ListingRow>(
            "SELECT title, company_name, location, description, apply_url, posted_at, salary_text, source_id, skills, salary_min, salary_max, salary_currency, salary_period, remote, fingerprint \
             FROM listings \
             WHERE ($1::text = '' OR location ILIKE '%' || $1 || '%' OR remote) \
               AND (cardinality($2::text[]) = 0 OR skills && $2) \
             ORDER BY seen_at DESC LIMIT 200",
        )
        .bind(location.to_lowercase())
        .bind(&wanted)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_listing).collect())
    }
}

fn row_to_listing(row: ListingRow) -> NormalizedListing {
    let salary = row.salary_currency.as_ref().map(|currency| Salary {
        min: row.salary_min,
        max: row.salary_max,
        currency: currency.clone(),
        period: row
            .salary_period
            .as_deref()
            .map(parse_period)
            .unwrap_or(SalaryPeriod::Yearly),
    });

    NormalizedListing {
        raw: RawListing {
            title: row.title,
            company_name: row.company_name,
            location: row.location,
            description: row.description,
            apply_url: row.apply_url,
            posted_at: row.posted_at,
            salary_text: row.salary_text,
            source_id: row.source_id,
        },
        skills: row.skills.into_iter().collect::<BTreeSet<_>>(),
        salary,
        remote: row.remote,
        fingerprint: row.fingerprint,
    }
}

fn period_str(period: SalaryPeriod) -> &'static str {
    match period {
        SalaryPeriod::Yearly => "yearly",
        SalaryPeriod::Monthly => "monthly",
        SalaryPeriod::Hourly => "hourly",
    }
}

fn parse_period(s: &str) -> SalaryPeriod {
    match s {
        "monthly" => SalaryPeriod::Monthly,
        "hourly" => SalaryPeriod::Hourly,
        _ => SalaryPeriod::Yearly,
    }
}
