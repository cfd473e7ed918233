//! Races dimension: one record per season + event pair.
//!
//! Event dates arrive as free-form strings scraped from the event page:
//! a single date ("27 May 2024") or a range ("25 - 27 Oct 2024") whose start
//! side may omit the month and year. Both bounds are canonicalized to
//! `%d-%m-%Y`; anything unparseable is stored verbatim in both fields with a
//! logged warning; date trouble never aborts a run.

use crate::discovery::MetadataFileRef;
use crate::store::{self, EventMetadata};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Canonical output format for event dates.
const DATE_FORMAT: &str = "%d-%m-%Y";

/// One race weekend in the races dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub race_id: u32,
    pub year: i32,
    pub grand_prix: String,
    #[serde(default)]
    pub circuit: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

/// Normalized lookup key for an event: lowercased, separators unified,
/// apostrophes stripped, so directory names and display names agree.
pub fn race_key(season: i32, event: &str) -> (i32, String) {
    let normalized = event
        .to_lowercase()
        .replace([' ', '-'], "_")
        .replace('\'', "");
    (season, normalized)
}

/// The races dimension and its (season, event) index.
#[derive(Debug, Default)]
pub struct RaceDimension {
    records: Vec<EventRecord>,
    index: HashMap<(i32, String), u32>,
}

impl RaceDimension {
    /// Build the dimension from discovered metadata files.
    ///
    /// Ids are sequential in discovery order. A metadata file that fails to
    /// load still yields a minimal record (season and event name only), so
    /// that event's facts remain joinable.
    pub fn build(metadata_files: &[MetadataFileRef]) -> Self {
        let mut dimension = RaceDimension::default();
        for file_ref in metadata_files {
            match store::load_event_metadata(&file_ref.path) {
                Ok(metadata) => dimension.insert(file_ref, Some(metadata)),
                Err(e) => {
                    warn!(season = file_ref.season, event = %file_ref.event, error = %e,
                        "metadata unreadable, creating minimal race entry");
                    dimension.insert(file_ref, None);
                }
            }
        }
        dimension
    }

    fn insert(&mut self, file_ref: &MetadataFileRef, metadata: Option<EventMetadata>) {
        let race_id = self.records.len() as u32 + 1;
        let metadata = metadata.unwrap_or_default();

        let raw_date = metadata.date.unwrap_or_default();
        let (start_date, end_date) = match parse_event_dates(&raw_date) {
            Some(bounds) => bounds,
            None => {
                if !raw_date.is_empty() {
                    warn!(season = file_ref.season, event = %file_ref.event, date = %raw_date,
                        "unparseable event date, keeping raw string");
                }
                (raw_date.clone(), raw_date)
            }
        };

        let record = EventRecord {
            race_id,
            year: file_ref.season,
            grand_prix: metadata.grand_prix.unwrap_or_else(|| file_ref.event.clone()),
            circuit: metadata.circuit.unwrap_or_default(),
            city: metadata.city.unwrap_or_default(),
            start_date,
            end_date,
        };

        self.index
            .entry(race_key(file_ref.season, &file_ref.event))
            .or_insert(race_id);
        self.records.push(record);
    }

    /// Resolve an event directory name to its race id.
    pub fn race_id(&self, season: i32, event: &str) -> Option<u32> {
        self.index.get(&race_key(season, event)).copied()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a scraped event date string into canonical (start, end) bounds.
///
/// Range starts missing month/year borrow them from the end side. Returns
/// `None` when neither bound parses.
pub fn parse_event_dates(raw: &str) -> Option<(String, String)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some((start_part, end_part)) = raw.split_once(" - ") {
        let end_part = end_part.trim();
        let mut start_part = start_part.trim().to_string();

        // Start side like "25" or "25 Oct" inherits the missing pieces
        // from the end side.
        let start_tokens = start_part.split_whitespace().count();
        if start_tokens < 3 {
            let end_tokens: Vec<&str> = end_part.split_whitespace().collect();
            if end_tokens.len() == 3 {
                let suffix = end_tokens[start_tokens..].join(" ");
                start_part = format!("{start_part} {suffix}");
            }
        }

        let start = NaiveDate::parse_from_str(&start_part, "%d %b %Y").ok()?;
        let end = NaiveDate::parse_from_str(end_part, "%d %b %Y").ok()?;
        Some((
            start.format(DATE_FORMAT).to_string(),
            end.format(DATE_FORMAT).to_string(),
        ))
    } else {
        let date = NaiveDate::parse_from_str(raw, "%d %b %Y").ok()?;
        let formatted = date.format(DATE_FORMAT).to_string();
        Some((formatted.clone(), formatted))
    }
}
