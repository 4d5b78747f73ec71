use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::FetchError;
use crate::models::listing::{RawListing, SearchQuery};
use crate::sources::{JobSource, build_client, keywords, urlencoded};

const API_URL: &str = "https://api.stackexchange.com/2.3/jobs";

pub struct StackOverflow;

#[derive(Debug, Deserialize)]
struct JobsEnvelope {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct StackJob {
    title: String,
    company_name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    creation_date: Option<i64>,
    #[serde(default)]
    link: Option<String>,
}

#[async_trait]
impl JobSource for StackOverflow {
    fn id(&self) -> &'static str {
        "stackoverflow"
    }

    fn min_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(1)
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, FetchError> {
        let client = build_client()?;
        let url = format!(
            "{API_URL}?site=stackoverflow&pagesize=100&title={}",
            urlencoded(&keywords(query))
        );

        let resp = client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let envelope: JobsEnvelope = resp
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let mut listings = Vec::new();
        for item in envelope.items {
            let Ok(job) = serde_json::from_value::<StackJob>(item) else {
                continue;
            };
            listings.push(to_raw(job));
        }
        Ok(listings)
    }
}

fn to_raw(job: StackJob) -> RawListing {
    let posted_at = job
        .creation_date
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    // Tags land in the description so skill extraction picks them up.
    let mut description = job.body.unwrap_or_default();
    if !job.tags.is_empty() {
        description.push(' ');
        description.push_str(&job.tags.join(" "));
    }

    RawListing {
        title: job.title,
        company_name: job.company_name,
        location: job.location.unwrap_or_default(),
        description,
        apply_url: job.link.unwrap_or_default(),
        posted_at,
        salary_text: None,
        source_id: "stackoverflow".to_string(),
    }
}
