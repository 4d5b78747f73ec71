use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::error::FetchError;
use crate::models::listing::{RawListing, SearchQuery};
use crate::sources::{JobSource, build_client, get_text, keywords, urlencoded};

const BASE_URL: &str = "https://weworkremotely.com";

pub struct WeWorkRemotely;

#[async_trait]
impl JobSource for WeWorkRemotely {
    fn id(&self) -> &'static str {
        "weworkremotely"
    }

    fn min_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(3)
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, FetchError> {
        let client = build_client()?;
        let url = format!(
            "{BASE_URL}/remote-jobs/search?term={}",
            urlencoded(&keywords(query))
        );
        let html = get_text(&client, &url).await?;
        parse_listings(&html)
    }
}

/// Extract listings from the search results page. A card missing its
/// title or link is skipped; an unrecognizable page is a parse error.
fn parse_listings(html: &str) -> Result<Vec<RawListing>, FetchError> {
    let card_sel = Selector::parse("li.feature, li.job")
        .map_err(|e| FetchError::Parse(e.to_string()))?;
    let title_sel = Selector::parse("span.title").map_err(|e| FetchError::Parse(e.to_string()))?;
    let company_sel =
        Selector::parse("span.company").map_err(|e| FetchError::Parse(e.to_string()))?;
    let link_sel = Selector::parse("a[href]").map_err(|e| FetchError::Parse(e.to_string()))?;

    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for card in document.select(&card_sel) {
        let Some(link) = card.select(&link_sel).next() else {
            continue;
        };
        let Some(title) = card
            .select(&title_sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
        else {
            continue;
        };
        let company = card
            .select(&company_sel)
            .next()
            .map(|c| c.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let href = link.value().attr("href").unwrap_or_default();

        listings.push(RawListing {
            title,
            company_name: company,
            location: "Remote".to_string(),
            description: String::new(),
            apply_url: format!("{BASE_URL}{href}"),
            posted_at: None,
            salary_text: None,
            source_id: "weworkremotely".to_string(),
        });
    }

    Ok(listings)
}
