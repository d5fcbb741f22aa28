//! Free-text query to structured filters.
//!
//! [`FilterTranslator::translate`] asks the NLP service first and silently
//! falls back to [`parse_locally`] on any failure or timeout.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::RoundingStrategy;
use serde::Serialize;

use crate::filter::ListingFilters;
use crate::listing::{Listing, PropertyType};
use crate::ports::NlpService;
use crate::types::Decimal;

/// How many listings a natural-language search shows.
pub const SHOWN_RESULTS: usize = 10;

const MAX_SUGGESTIONS: usize = 5;

const LAKH: i64 = 100_000;
const CRORE: i64 = 10_000_000;

static BEDROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(bhk|bedroom|bed)").expect("valid regex"));

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(lakh|cr|crore|lakhs|crores)").expect("valid regex"));

/// Scanned in order; the first keyword hit decides the type.
const PROPERTY_TYPE_KEYWORDS: &[(&[&str], PropertyType)] = &[
    (&["apartment", "flat"], PropertyType::Apartment),
    (&["house"], PropertyType::House),
    (&["villa"], PropertyType::Villa),
    (&["plot", "land"], PropertyType::Plot),
    (&["commercial", "office"], PropertyType::Commercial),
];

const KNOWN_CITIES: &[&str] = &[
    "mumbai",
    "delhi",
    "bangalore",
    "hyderabad",
    "chennai",
    "kolkata",
    "pune",
    "ahmedabad",
    "surat",
    "jaipur",
    "lucknow",
    "kanpur",
    "nagpur",
    "indore",
    "thane",
    "bhopal",
    "visakhapatnam",
    "pimpri",
    "patna",
    "vadodara",
    "ghaziabad",
    "ludhiana",
    "agra",
    "nashik",
];

/// Every matching entry contributes its amenity.
const AMENITY_KEYWORDS: &[(&[&str], &str)] = &[
    (&["parking"], "Parking"),
    (&["gym", "fitness"], "Gym"),
    (&["pool", "swimming"], "Swimming Pool"),
    (&["garden"], "Garden"),
    (&["security"], "24/7 Security"),
    (&["lift", "elevator"], "Elevator"),
    (&["power backup"], "Power Backup"),
];

const SUGGESTIONS: &[&str] = &[
    "2 BHK apartment in Mumbai",
    "3 BHK house with parking",
    "Villa under 1 crore",
    "Commercial property in Bangalore",
    "Plot near highway",
    "Luxury apartment with gym",
    "4 BHK penthouse",
    "Budget apartment under 50 lakhs",
];

// ---------------------------------------------------------------------------
// Local parsing
// ---------------------------------------------------------------------------

/// Keyword and regex extraction used when the NLP service is unavailable.
pub fn parse_locally(query: &str) -> ListingFilters {
    let lower = query.to_lowercase();
    let mut filters = ListingFilters::default();

    filters.property_type = PROPERTY_TYPE_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, property_type)| *property_type);

    filters.bedrooms = BEDROOMS_RE
        .captures(&lower)
        .and_then(|caps| caps[1].parse::<i32>().ok());

    if let Some(caps) = PRICE_RE.captures(&lower) {
        if let Ok(amount) = caps[1].parse::<i64>() {
            let multiplier = if caps[2].contains("cr") { CRORE } else { LAKH };
            if let Some(max) = amount.checked_mul(multiplier) {
                filters.max_price = Some(Decimal::from(max));
                filters.min_price = Some(Decimal::from(max / 2));
            }
        }
    }

    filters.city = KNOWN_CITIES
        .iter()
        .find(|city| lower.contains(*city))
        .map(|city| capitalize(city));

    filters.amenities = AMENITY_KEYWORDS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, amenity)| amenity.to_string())
        .collect();

    filters
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Summary and suggestions
// ---------------------------------------------------------------------------

/// Human-readable description of a search result.
///
/// `fetched` is the page the average and the city commentary are computed
/// over; `total` is the full match count.
pub fn summarize(query: &str, fetched: &[Listing], total: i64) -> String {
    if total == 0 {
        return format!(
            "No properties found matching \"{query}\". Try adjusting your search criteria."
        );
    }

    let mut summary = format!("Found {total} properties");

    if !fetched.is_empty() {
        let sum: Decimal = fetched.iter().map(|l| l.price).sum();
        let average = sum / Decimal::from(fetched.len());
        let lakhs = (average / Decimal::from(LAKH))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        summary.push_str(&format!(
            " with an average price of ₹{} lakhs",
            lakhs.to_i64().unwrap_or_default()
        ));

        let mut seen = HashSet::new();
        let cities: Vec<&str> = fetched
            .iter()
            .map(|l| l.city.as_str())
            .filter(|city| seen.insert(*city))
            .collect();
        match cities.len() {
            1 => summary.push_str(&format!(" in {}", cities[0])),
            2..=3 => summary.push_str(&format!(" across {}", cities.join(", "))),
            _ => {}
        }
    }

    let shown = total.min(SHOWN_RESULTS as i64);
    summary.push_str(&format!(". Showing top {shown} results."));
    summary
}

/// Canned queries containing `partial` (case-insensitive), at most five.
pub fn suggestions(partial: &str) -> Vec<String> {
    let needle = partial.to_lowercase();
    SUGGESTIONS
        .iter()
        .filter(|s| s.to_lowercase().contains(&needle))
        .take(MAX_SUGGESTIONS)
        .map(|s| s.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationSource {
    Nlp,
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    pub filters: ListingFilters,
    pub intent: Option<String>,
    pub source: TranslationSource,
}

#[derive(Clone, Default)]
pub struct FilterTranslator {
    nlp: Option<Arc<dyn NlpService>>,
}

impl FilterTranslator {
    pub fn new(nlp: Option<Arc<dyn NlpService>>) -> Self {
        Self { nlp }
    }

    pub fn local_only() -> Self {
        Self { nlp: None }
    }

    /// Never fails: NLP errors and timeouts degrade to local parsing.
    pub async fn translate(&self, query: &str, context: Option<&serde_json::Value>) -> Translation {
        if let Some(nlp) = &self.nlp {
            match tokio::time::timeout(nlp.timeout(), nlp.parse_query(query, context)).await {
                Ok(Ok(parsed)) => {
                    return Translation {
                        filters: parsed.filters,
                        intent: parsed.intent.filter(|i| !i.is_empty()),
                        source: TranslationSource::Nlp,
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "NLP parse failed, using local parser");
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = nlp.timeout().as_millis() as u64,
                        "NLP parse timed out, using local parser"
                    );
                }
            }
        }

        Translation {
            filters: parse_locally(query),
            intent: None,
            source: TranslationSource::Local,
        }
    }
}

impl std::fmt::Debug for FilterTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterTranslator")
            .field("nlp", &self.nlp.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
