mod query;

pub use query::{
    Category, Country, Furnishing, LocationOption, Query, RentalPeriod, SortBy,
};

use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Flat listing record, one per raw listing on a results page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(rename = "ID")]
    pub id: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Property Type")]
    pub property_type: Option<String>,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Bedrooms")]
    pub bedrooms: Option<String>,
    #[serde(rename = "Bathrooms")]
    pub bathrooms: Option<String>,
    #[serde(rename = "Size")]
    pub size: Option<String>,
    #[serde(rename = "Furnished")]
    pub furnished: Option<String>,
    #[serde(rename = "Listed Date")]
    pub listed_date: Option<String>,
    #[serde(rename = "RERA ID")]
    pub rera_id: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "Map Link")]
    pub map_link: String,
    #[serde(rename = "Listing URL")]
    pub listing_url: Option<String>,
    #[serde(rename = "Image URL")]
    pub image_url: Option<String>,
    #[serde(rename = "Agent Name")]
    pub agent_name: Option<String>,
    #[serde(rename = "Agent Email")]
    pub agent_email: Option<String>,
    #[serde(rename = "Super Agent")]
    pub super_agent: Option<bool>,
    #[serde(rename = "Broker Name")]
    pub broker_name: Option<String>,
    #[serde(rename = "Broker Email")]
    pub broker_email: Option<String>,
    #[serde(rename = "Broker Phone")]
    pub broker_phone: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
}

/// Outcome of fetching one results page
#[derive(Debug, Clone)]
pub enum PageResult {
    /// Hydration payload text extracted from the page
    Success(String),
    /// Page was reachable but carried no payload
    Empty,
    Failed(FetchError),
}

/// Why pagination stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TerminalReason {
    EmptyPage { page: u32 },
    ShortPage { page: u32, count: usize },
    RetryExhausted { page: u32 },
    PageCap { page: u32 },
}

impl TerminalReason {
    /// Page whose evaluation ended the session
    pub fn page(&self) -> u32 {
        match *self {
            TerminalReason::EmptyPage { page }
            | TerminalReason::ShortPage { page, .. }
            | TerminalReason::RetryExhausted { page }
            | TerminalReason::PageCap { page } => page,
        }
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalReason::EmptyPage { page } => write!(f, "empty page ({page})"),
            TerminalReason::ShortPage { page, count } => {
                write!(f, "short page ({page}, {count} records)")
            }
            TerminalReason::RetryExhausted { page } => write!(f, "retry exhaustion ({page})"),
            TerminalReason::PageCap { page } => write!(f, "page cap ({page})"),
        }
    }
}

/// Records gathered by one pagination run, keyed by page
#[derive(Debug, Clone)]
pub struct FetchSession {
    pages: BTreeMap<u32, Vec<NormalizedRecord>>,
    terminal: TerminalReason,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl FetchSession {
    pub fn new(
        pages: BTreeMap<u32, Vec<NormalizedRecord>>,
        terminal: TerminalReason,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            pages,
            terminal,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn terminal(&self) -> TerminalReason {
        self.terminal
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn record_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    pub fn page(&self, page: u32) -> Option<&[NormalizedRecord]> {
        self.pages.get(&page).map(Vec::as_slice)
    }

    /// Records in ascending page order
    pub fn records(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.pages.values().flatten()
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.pages.into_values().flatten().collect()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> NormalizedRecord {
        NormalizedRecord {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_session_flattens_in_page_order() {
        let mut pages = BTreeMap::new();
        pages.insert(2, vec![record("c")]);
        pages.insert(1, vec![record("a"), record("b")]);

        let session = FetchSession::new(
            pages,
            TerminalReason::ShortPage { page: 2, count: 1 },
            Utc::now(),
        );

        let ids: Vec<_> = session.records().filter_map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(session.record_count(), 3);
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.terminal().page(), 2);
    }

    #[test]
    fn test_record_serializes_with_sheet_headers() {
        let value = serde_json::to_value(record("42")).unwrap();
        assert_eq!(value["ID"], "42");
        assert!(value.get("Map Link").is_some());
        assert!(value["Super Agent"].is_null());
    }
}
