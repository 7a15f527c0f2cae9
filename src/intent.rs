//! Free-text query routing
//!
//! Maps a plain question ("lékárna v Brně", "N02BE01", "0254045") onto one of
//! the MCP tools with pattern matching only.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Result count used for free-text searches
pub const INTENT_SEARCH_LIMIT: u32 = 5;

static SUKL_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4,7}$").unwrap());

static ATC_PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^ATC\s+(.+)$").unwrap());

static ATC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z]\d{2}(?:[A-Z]{2}\d{2})?$").unwrap());

// "ve" must come before "v" and the preposition needs trailing whitespace,
// otherwise "ve Zlíně" would leave "e Zlíně" as the city.
static PHARMACY_CITY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:lékárn\w*|lekarn\w*|pharmacy)\s+(?:(?:ve|v|na|blízko|poblíž|u|kolem)\s+)?(.+)",
    )
    .unwrap()
});

const PHARMACY_KEYWORDS: &[&str] = &[
    "lékárn", "lekarn", "pharmacy", "lékáren", "lékárna", "lekarna", "lekarny", "lékárny",
];

/// What a free-text query is asking for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "lowercase")]
pub enum QueryIntent {
    Search { query: String, limit: u32 },
    Detail { sukl_code: String },
    Atc { atc_code: String },
    Pharmacy { city: Option<String> },
}

impl QueryIntent {
    /// MCP tool that answers this intent
    pub fn tool_name(&self) -> &'static str {
        match self {
            QueryIntent::Search { .. } => "search-medicine",
            QueryIntent::Detail { .. } => "get-medicine-details",
            QueryIntent::Atc { .. } => "get-atc-info",
            QueryIntent::Pharmacy { .. } => "find-pharmacies",
        }
    }

    /// Arguments object for the tool call
    pub fn arguments(&self) -> Value {
        match self {
            QueryIntent::Search { query, limit } => json!({ "query": query, "limit": limit }),
            QueryIntent::Detail { sukl_code } => json!({ "sukl_code": sukl_code }),
            QueryIntent::Atc { atc_code } => json!({ "atc_code": atc_code }),
            QueryIntent::Pharmacy { city: Some(city) } => json!({ "city": city }),
            QueryIntent::Pharmacy { city: None } => json!({}),
        }
    }
}

/// Classify a free-text query
pub fn parse_query(input: &str) -> QueryIntent {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return QueryIntent::Search {
            query: String::new(),
            limit: INTENT_SEARCH_LIMIT,
        };
    }

    if SUKL_CODE_PATTERN.is_match(trimmed) {
        return QueryIntent::Detail {
            sukl_code: trimmed.to_string(),
        };
    }

    if let Some(caps) = ATC_PREFIX_PATTERN.captures(trimmed) {
        return QueryIntent::Atc {
            atc_code: caps[1].trim().to_uppercase(),
        };
    }

    if ATC_PATTERN.is_match(trimmed) {
        return QueryIntent::Atc {
            atc_code: trimmed.to_uppercase(),
        };
    }

    let lower = trimmed.to_lowercase();
    if PHARMACY_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        let city = PHARMACY_CITY_PATTERN
            .captures(trimmed)
            .map(|caps| caps[1].trim().to_string())
            .filter(|city| !city.is_empty());
        return QueryIntent::Pharmacy { city };
    }

    QueryIntent::Search {
        query: trimmed.to_string(),
        limit: INTENT_SEARCH_LIMIT,
    }
}
