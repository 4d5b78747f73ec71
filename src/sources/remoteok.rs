use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::FetchError;
use crate::models::listing::{RawListing, SearchQuery};
use crate::sources::{JobSource, build_client, keywords};

const API_URL: &str = "https://remoteok.io/api";

pub struct RemoteOk;

/// Strict shape of one RemoteOK API entry. Items that fail to
/// deserialize into this are skipped, not fatal.
#[derive(Debug, Deserialize)]
struct RemoteOkJob {
    position: String,
    company: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    salary: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[async_trait]
impl JobSource for RemoteOk {
    fn id(&self) -> &'static str {
        "remoteok"
    }

    fn min_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(2)
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, FetchError> {
        let client = build_client()?;
        let resp = client
            .get(API_URL)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let items: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let wanted = keywords(query).to_lowercase();
        let mut listings = Vec::new();

        // The first array element is API metadata, not a job.
        for item in items.into_iter().skip(1) {
            let Ok(job) = serde_json::from_value::<RemoteOkJob>(item) else {
                continue;
            };
            if !matches_criteria(&job, &wanted) {
                continue;
            }
            listings.push(to_raw(job));
        }

        Ok(listings)
    }
}

fn matches_criteria(job: &RemoteOkJob, wanted: &str) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {}",
        job.position,
        job.description.as_deref().unwrap_or(""),
        job.tags.join(" ")
    )
    .to_lowercase();
    wanted.split_whitespace().any(|term| haystack.contains(term))
}

fn to_raw(job: RemoteOkJob) -> RawListing {
    let posted_at = job
        .date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .map(|d| d.with_timezone(&Utc));

    RawListing {
        title: job.position,
        company_name: job.company,
        location: job.location.unwrap_or_else(|| "Remote".to_string()),
        description: job.description.unwrap_or_default(),
        apply_url: job.url.unwrap_or_default(),
        posted_at,
        salary_text: job.salary.filter(|s| !s.is_empty()),
        source_id: "remoteok".to_string(),
    }
}
