use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_CATEGORY: &str = "news";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// A market exactly as the model wrote it; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawMarket {
    pub question: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub category: Option<String>,
    pub betting_closes_at: Option<String>,
    pub resolves_at: Option<String>,
    pub resolution_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketProposal {
    pub question: String,
    pub description: String,
    pub source_url: String,
    pub category: String,
    pub betting_closes_at: DateTime<Utc>,
    pub resolves_at: DateTime<Utc>,
    pub resolution_context: String,
}

impl MarketProposal {
    /// `None` when either timestamp is missing or unparsable.
    pub fn from_raw(raw: RawMarket) -> Option<Self> {
        let betting_closes_at = parse_timestamp(raw.betting_closes_at.as_deref()?)?;
        let resolves_at = parse_timestamp(raw.resolves_at.as_deref()?)?;

        Some(Self {
            question: raw.question.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            source_url: raw.source_url.unwrap_or_default(),
            category: raw
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            betting_closes_at,
            resolves_at,
            resolution_context: raw.resolution_context.unwrap_or_default(),
        })
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.question.ends_with('?')
            && self.betting_closes_at > now
            && self.resolves_at > self.betting_closes_at
    }

    /// Case- and edge-whitespace-insensitive question key.
    pub fn dedupe_key(&self) -> String {
        self.question.trim().to_lowercase()
    }
}

/// RFC 3339, or a zone-less ISO timestamp read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Drops repeated questions; the first occurrence wins.
pub fn dedupe_proposals(proposals: Vec<MarketProposal>) -> Vec<MarketProposal> {
    let mut seen = HashSet::new();
    proposals
        .into_iter()
        .filter(|proposal| seen.insert(proposal.dedupe_key()))
        .collect()
}
