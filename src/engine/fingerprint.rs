//! Duplicate collapse for near-identical postings: the same job posted to
//! multiple boards, or re-scraped with whitespace/casing differences.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::models::listing::{NormalizedListing, RawListing};

/// Lowercase, strip non-alphanumerics, collapse runs of whitespace.
pub fn normalize_text(s: &str) -> String {
    let mapped: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Company names lose all spacing and punctuation so "Acme, Inc." and
/// "acme inc" collide.
fn normalize_company(s: &str) -> String {
    s.to_lowercase().chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Stable identity for a posting: hash of normalized title, company and
/// location. Unrelated fields (description, URL, source) do not affect it.
pub fn fingerprint(raw: &RawListing) -> String {
    let identity = format!(
        "{}|{}|{}",
        normalize_text(&raw.title),
        normalize_company(&raw.company_name),
        normalize_text(&raw.location)
    );
    let digest = Sha256::digest(identity.as_bytes());
    hex::encode(digest)[..32].to_string()
}

/// Normalized edit-distance similarity in [0,1]. 1.0 means identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let dist = strsim::levenshtein(a, b);
    (max_len - dist) as f64 / max_len as f64
}

#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Source ids that win exact-duplicate collisions, highest priority
    /// first. Sources not listed fall back to first-seen-wins.
    pub preferred_sources: Vec<String>,
    /// Enable the O(n^2) fuzzy pass over the exact-deduplicated set.
    pub fuzzy_pass: bool,
    pub fuzzy_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            preferred_sources: Vec::new(),
            fuzzy_pass: false,
            fuzzy_threshold: 0.85,
        }
    }
}

/// Collapse duplicates, returning the surviving listings and the number
/// removed. Idempotent: running it on its own output removes nothing.
pub fn dedup(
    listings: Vec<NormalizedListing>,
    cfg: &DedupConfig,
) -> (Vec<NormalizedListing>, usize) {
    let before = listings.len();

    // Exact pass: first seen wins unless a preferred source outranks the
    // incumbent, which makes the winner independent of arrival order.
    let mut kept: Vec<NormalizedListing> = Vec::new();
    let mut by_fingerprint: HashMap<String, usize> = HashMap::new();

    for listing in listings {
        match by_fingerprint.get(&listing.fingerprint) {
            Some(&idx) => {
                if source_rank(&listing.raw.source_id, cfg)
                    < source_rank(&kept[idx].raw.source_id, cfg)
                {
                    kept[idx] = listing;
                }
            }
            None => {
                by_fingerprint.insert(listing.fingerprint.clone(), kept.len());
                kept.push(listing);
            }
        }
    }

    if cfg.fuzzy_pass {
        kept = fuzzy_pass(kept, cfg.fuzzy_threshold);
    }

    let removed = before - kept.len();
    (kept, removed)
}

fn source_rank(source_id: &str, cfg: &DedupConfig) -> usize {
    cfg.preferred_sources
        .iter()
        .position(|s| s == source_id)
        .unwrap_or(usize::MAX)
}

/// Secondary pass for suspected variants whose exact fingerprints differ.
/// Pairwise, so only run on already-small deduplicated sets.
fn fuzzy_pass(listings: Vec<NormalizedListing>, threshold: f64) -> Vec<NormalizedListing> {
    let mut kept: Vec<NormalizedListing> = Vec::new();
    let mut identities: Vec<String> = Vec::new();

    for listing in listings {
        let identity = format!(
            "{} {} {}",
            normalize_text(&listing.raw.title),
            normalize_company(&listing.raw.company_name),
            normalize_text(&listing.raw.location)
        );
        let dup = identities.iter().any(|seen| similarity(seen, &identity) > threshold);
        if !dup {
            identities.push(identity);
            kept.push(listing);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::RawListing;
    use std::collections::BTreeSet;

    fn raw(title: &str, company: &str, location: &str, source: &str) -> RawListing {
        RawListing {
            title: title.to_string(),
            company_name: company.to_string(),
            location: location.to_string(),
            description: String::new(),
            apply_url: String::new(),
            posted_at: None,
            salary_text: None,
            source_id: source.to_string(),
        }
    }

    fn normalized(title: &str, company: &str, location: &str, source: &str) -> NormalizedListing {
        let raw = raw(title, company, location, source);
        let fp = fingerprint(&raw);
        NormalizedListing {
            raw,
            skills: BTreeSet::new(),
            salary: None,
            remote: false,
            fingerprint: fp,
        }
    }

    #[test]
    fn fingerprint_ignores_case_and_whitespace() {
        let a = raw("Backend  Engineer", "Acme, Inc.", "Pune", "a");
        let b = raw("backend engineer", "ACME Inc", "  pune ", "b");
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_ignores_unrelated_fields() {
        let mut a = raw("Engineer", "Acme", "Pune", "a");
        let mut b = raw("Engineer", "Acme", "Pune", "b");
        a.description = "long description".to_string();
        a.apply_url = "https://a.example".to_string();
        b.description = "different".to_string();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn distinct_jobs_get_distinct_fingerprints() {
        let a = raw("Backend Engineer", "Acme", "Pune", "a");
        let b = raw("Frontend Engineer", "Acme", "Pune", "a");
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let s = similarity("javascript", "javascrpt");
        assert!(s > 0.8 && s < 1.0);
    }

    #[test]
    fn exact_dedup_keeps_first_seen() {
        let cfg = DedupConfig::default();
        let listings = vec![
            normalized("Backend Engineer", "Acme", "Pune", "remoteok"),
            normalized("backend  ENGINEER", "acme", "pune", "dice"),
            normalized("Frontend Engineer", "Acme", "Pune", "dice"),
        ];
        let (kept, removed) = dedup(listings, &cfg);
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 1);
        assert_eq!(kept[0].raw.source_id, "remoteok");
    }

    #[test]
    fn preferred_source_overrides_arrival_order() {
        let cfg = DedupConfig {
            preferred_sources: vec!["dice".to_string()],
            ..DedupConfig::default()
        };
        let listings = vec![
            normalized("Backend Engineer", "Acme", "Pune", "remoteok"),
            normalized("Backend Engineer", "Acme", "Pune", "dice"),
        ];
        let (kept, removed) = dedup(listings, &cfg);
        assert_eq!(kept.len(), 1);
        assert_eq!(removed, 1);
        assert_eq!(kept[0].raw.source_id, "dice");
    }

    #[test]
    fn dedup_is_idempotent() {
        let cfg = DedupConfig {
            fuzzy_pass: true,
            ..DedupConfig::default()
        };
        let listings = vec![
            normalized("Backend Engineer", "Acme", "Pune", "a"),
            normalized("Backend Engineer", "Acme", "Pune", "b"),
            normalized("Backend Enginer", "Acme", "Pune", "c"),
            normalized("Data Scientist", "Globex", "Berlin", "a"),
        ];
        let (once, _) = dedup(listings, &cfg);
        let (twice, removed_again) = dedup(once.clone(), &cfg);
        assert_eq!(removed_again, 0);
        assert_eq!(once.len(), twice.len());
        let fps: Vec<_> = once.iter().map(|l| &l.fingerprint).collect();
        let fps2: Vec<_> = twice.iter().map(|l| &l.fingerprint).collect();
        assert_eq!(fps, fps2);
    }

    #[test]
    fn fuzzy_pass_collapses_typo_variants() {
        let cfg = DedupConfig {
            fuzzy_pass: true,
            ..DedupConfig::default()
        };
        let listings = vec![
            normalized("Senior Backend Engineer", "Acme", "Pune", "a"),
            normalized("Senior Backend Enginee", "Acme", "Pune", "b"),
        ];
        let (kept, removed) = dedup(listings, &cfg);
        assert_eq!(kept.len(), 1);
        assert_eq!(removed, 1);
    }
}
