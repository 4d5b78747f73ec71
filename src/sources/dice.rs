use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::error::FetchError;
use crate::models::listing::{RawListing, SearchQuery};
use crate::sources::{JobSource, build_client, get_text, keywords, urlencoded};

const BASE_URL: &str = "https://www.dice.com";

pub struct Dice;

#[async_trait]
impl JobSource for Dice {
    fn id(&self) -> &'static str {
        "dice"
    }

    fn min_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(3)
    }

    async fn fetch(&self, query: &SearchQuery) -> Result<Vec<RawListing>, FetchError> {
        let client = build_client()?;
        let url = format!(
            "{BASE_URL}/jobs?q={}&location={}&pageSize=20",
            urlencoded(&keywords(query)),
            urlencoded(&query.location)
        );
        let html = get_text(&client, &url).await?;
        parse_listings(&html)
    }
}

fn parse_listings(html: &str) -> Result<Vec<RawListing>, FetchError> {
    let card_sel = Selector::parse("div.card, div.search-result")
        .map_err(|e| FetchError::Parse(e.to_string()))?;
    let title_sel = Selector::parse("a.card-title-link, a.job-title, h3 a")
        .map_err(|e| FetchError::Parse(e.to_string()))?;
    let company_sel = Selector::parse(".company, .employer")
        .map_err(|e| FetchError::Parse(e.to_string()))?;
    let location_sel = Selector::parse(".location, .job-location")
        .map_err(|e| FetchError::Parse(e.to_string()))?;
    let salary_sel = Selector::parse(".salary, .compensation")
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for card in document.select(&card_sel) {
        let Some(title_el) = card.select(&title_sel).next() else {
            continue;
        };
        let title = title_el.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let text_of = |sel: &Selector| {
            card.select(sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let href = title_el.value().attr("href").unwrap_or_default();
        let apply_url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{BASE_URL}{href}")
        };

        listings.push(RawListing {
            title,
            company_name: text_of(&company_sel).unwrap_or_else(|| "Unknown".to_string()),
            location: text_of(&location_sel).unwrap_or_default(),
            description: String::new(),
            apply_url,
            posted_at: None,
            salary_text: text_of(&salary_sel),
            source_id: "dice".to_string(),
        });
    }

    Ok(listings)
}
