// Source adapters: one module per external job board. Each adapter
// normalizes its provider-specific response into RawListing; malformed
// individual items are skipped, only total unavailability is an error.

pub mod dice;
pub mod remoteok;
pub mod stackoverflow;
pub mod weworkremotely;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::FetchError;
use crate::models::listing::{RawListing, SearchQuery};

/// RFC 3986 unreserved characters, left unencoded in query values.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Trait that all job sources must implement.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Stable source id, also used as `RawListing::source_id`.
    fn id(&self) -> &'static str;

    /// Minimum spacing between consecutive requests to this source. The
    /// orchestrator must not call `fetch` more often than this.
    fn min_delay(&self) -> Duration {
        Duration::from_secs(2)
    }

    /// Fetch listings matching the query from the external source.
    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, FetchError>;
}

/// All built-in sources, in registry order.
pub fn default_sources() -> Vec<Arc<dyn JobSource>> {
    vec![
        Arc::new(remoteok::RemoteOk),
        Arc::new(stackoverflow::StackOverflow),
        Arc::new(weworkremotely::WeWorkRemotely),
        Arc::new(dice::Dice),
    ]
}

/// URL-encode a string for use in query parameters.
pub(crate) fn urlencoded(s: &str) -> String {
    utf8_percent_encode(s, QUERY_ENCODE_SET).to_string()
}

/// HTTP client with browser-like headers shared by all adapters.
pub(crate) fn build_client() -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::Http)
}

/// GET a URL and return the body as text, mapping non-2xx to FetchError.
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    Ok(resp.text().await?)
}

/// The search terms an adapter should match against: explicit role hint
/// if present, otherwise the candidate's skills joined as keywords.
pub(crate) fn keywords(query: &SearchQuery) -> String {
    match query.role.as_deref() {
        Some(role) if !role.trim().is_empty() => role.trim().to_string(),
        _ => query.skills.join(" "),
    }
}
