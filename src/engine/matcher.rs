//! Skill extraction and candidate/listing match scoring.
//!
//! Matching is deliberately coarse: case-insensitive substring containment
//! in both directions, so "java" matches "javascript". Callers must treat
//! the score as a heuristic, not ground truth.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::listing::{Salary, SalaryPeriod, ScoredListing};

/// Keyword table used to extract skills from listing text.
const SKILL_KEYWORDS: &[&str] = &[
    "python",
    "javascript",
    "java",
    "react",
    "node.js",
    "angular",
    "vue",
    "typescript",
    "html",
    "css",
    "sql",
    "mongodb",
    "postgresql",
    "mysql",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "git",
    "rest api",
    "graphql",
    "machine learning",
    "data science",
    "tensorflow",
    "pytorch",
    "spring boot",
    "django",
    "flask",
    "redis",
    "elasticsearch",
    "terraform",
    "ci/cd",
];

static SALARY_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([$€£₹])?\s*(\d[\d,]*(?:\.\d+)?)\s*(k)?\s*(?:-|–|to)\s*[$€£₹]?\s*(\d[\d,]*(?:\.\d+)?)\s*(k)?",
    )
    .expect("salary range regex")
});

static SALARY_SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([$€£₹])\s*(\d[\d,]*(?:\.\d+)?)\s*(k)?").expect("salary single regex")
});

/// Skills mentioned in a listing's title or description.
pub fn extract_skills(title: &str, description: &str) -> BTreeSet<String> {
    let text = format!("{title} {description}").to_lowercase();
    SKILL_KEYWORDS
        .iter()
        .filter(|kw| text.contains(*kw))
        .map(|kw| kw.to_string())
        .collect()
}

/// Whether the listing reads as a remote position.
pub fn is_remote(title: &str, location: &str) -> bool {
    let text = format!("{title} {location}").to_lowercase();
    text.contains("remote") || text.contains("work from home") || text.contains("wfh")
}

/// Percentage of candidate skills present in the listing, 0..=100.
/// An empty candidate set scores 0: no basis for comparison.
pub fn score(candidate_skills: &[String], listing_skills: &BTreeSet<String>) -> u8 {
    if candidate_skills.is_empty() {
        return 0;
    }
    let matched = candidate_skills
        .iter()
        .filter(|cand| {
            let cand = cand.to_lowercase();
            listing_skills
                .iter()
                .any(|ls| ls.contains(&cand) || cand.contains(ls.as_str()))
        })
        .count();
    ((100.0 * matched as f64 / candidate_skills.len() as f64).round() as u8).min(100)
}

/// Descending by match score, more recent postings first on ties.
/// Listings without a posted date sort after dated ones.
pub fn sort_listings(listings: &mut [ScoredListing]) {
    listings.sort_by(|a, b| {
        b.match_percentage
            .cmp(&a.match_percentage)
            .then_with(|| b.listing.raw.posted_at.cmp(&a.listing.raw.posted_at))
    });
}

/// Parse free-form salary text ("$120,000 - $150,000 per year",
/// "£40k-55k") into a structured salary. Lakh-style strings ("₹8L")
/// are not recognized.
pub fn parse_salary(text: &str) -> Option<Salary> {
    let period = if text.to_lowercase().contains("hour") || text.contains("/hr") {
        SalaryPeriod::Hourly
    } else if text.to_lowercase().contains("month") {
        SalaryPeriod::Monthly
    } else {
        SalaryPeriod::Yearly
    };

    if let Some(caps) = SALARY_RANGE_RE.captures(text) {
        let currency = currency_of(caps.get(1).map(|m| m.as_str()));
        let min = parse_amount(caps.get(2)?.as_str(), caps.get(3).is_some())?;
        let max = parse_amount(caps.get(4)?.as_str(), caps.get(5).is_some())?;
        return Some(Salary {
            min: Some(min),
            max: Some(max),
            currency,
            period,
        });
    }

    if let Some(caps) = SALARY_SINGLE_RE.captures(text) {
        let currency = currency_of(caps.get(1).map(|m| m.as_str()));
        let amount = parse_amount(caps.get(2)?.as_str(), caps.get(3).is_some())?;
        return Some(Salary {
            min: Some(amount),
            max: None,
            currency,
            period,
        });
    }

    None
}

fn parse_amount(digits: &str, thousands: bool) -> Option<i64> {
    let n: f64 = digits.replace(',', "").parse().ok()?;
    let n = if thousands { n * 1000.0 } else { n };
    Some(n as i64)
}

fn currency_of(symbol: Option<&str>) -> String {
    match symbol {
        Some("€") => "EUR",
        Some("£") => "GBP",
        Some("₹") => "INR",
        _ => "USD",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::{NormalizedListing, RawListing};
    use chrono::{Datelike, TimeZone, Utc};

    fn skills(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_known_skills() {
        let found = extract_skills(
            "Backend Engineer",
            "We use Node.js, MongoDB and Docker in production. SQL a plus.",
        );
        assert!(found.contains("node.js"));
        assert!(found.contains("mongodb"));
        assert!(found.contains("docker"));
        assert!(found.contains("sql"));
        assert!(!found.contains("react"));
    }

    #[test]
    fn score_is_bounded() {
        let listing = skills(&["python", "docker", "aws"]);
        let candidate: Vec<String> = vec!["python".into(), "docker".into(), "aws".into()];
        assert_eq!(score(&candidate, &listing), 100);

        let none: Vec<String> = vec!["cobol".into()];
        assert_eq!(score(&none, &listing), 0);
    }

    #[test]
    fn empty_candidate_scores_zero() {
        let listing = skills(&["python"]);
        assert_eq!(score(&[], &listing), 0);
    }

    #[test]
    fn containment_matches_both_directions() {
        // "java" (candidate) is contained in "javascript" (listing)
        let listing = skills(&["javascript"]);
        assert_eq!(score(&["java".to_string()], &listing), 100);

        // "node.js mongodb" listing vs candidate ["React", "Node.js"]
        let listing = skills(&["node.js", "mongodb"]);
        let candidate = vec!["React".to_string(), "Node.js".to_string()];
        assert_eq!(score(&candidate, &listing), 50);
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("Engineer (Remote)", "Anywhere"));
        assert!(is_remote("Engineer", "Work From Home"));
        assert!(is_remote("WFH Developer", ""));
        assert!(!is_remote("Engineer", "Pune, India"));
    }

    #[test]
    fn parses_salary_range_with_commas() {
        let s = parse_salary("$120,000 - $150,000 per year").unwrap();
        assert_eq!(s.min, Some(120_000));
        assert_eq!(s.max, Some(150_000));
        assert_eq!(s.currency, "USD");
        assert_eq!(s.period, SalaryPeriod::Yearly);
    }

    #[test]
    fn parses_k_suffix_and_hourly() {
        let s = parse_salary("£40k-55k").unwrap();
        assert_eq!(s.min, Some(40_000));
        assert_eq!(s.max, Some(55_000));
        assert_eq!(s.currency, "GBP");

        let h = parse_salary("$45 - $60 per hour").unwrap();
        assert_eq!(h.period, SalaryPeriod::Hourly);
    }

    #[test]
    fn unparsable_salary_is_none() {
        assert!(parse_salary("competitive").is_none());
        assert!(parse_salary("").is_none());
    }

    #[test]
    fn sort_orders_by_score_then_recency() {
        let mk = |score: u8, day: u32| ScoredListing {
            listing: NormalizedListing {
                raw: RawListing {
                    title: String::new(),
                    company_name: String::new(),
                    location: String::new(),
                    description: String::new(),
                    apply_url: String::new(),
                    posted_at: Some(Utc.with_ymd_and_hms(2026, 8, day, 0, 0, 0).unwrap()),
                    salary_text: None,
                    source_id: "t".into(),
                },
                skills: BTreeSet::new(),
                salary: None,
                remote: false,
                fingerprint: String::new(),
            },
            match_percentage: score,
        };

        let mut listings = vec![mk(50, 1), mk(80, 2), mk(80, 10)];
        sort_listings(&mut listings);
        assert_eq!(listings[0].match_percentage, 80);
        assert_eq!(listings[0].listing.raw.posted_at.unwrap().day(), 10);
        assert_eq!(listings[2].match_percentage, 50);
    }
}
