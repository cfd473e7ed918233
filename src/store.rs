//! Raw record store access.
//!
//! The raw record store is a directory tree produced by the retrieval layer:
//! season directories (integer-named) containing one directory per event,
//! each holding per-session JSON files plus an optional `race_metadata.json`.
//! Every session file carries a header row, zero or more data rows and an
//! optional session label. Files are immutable input; nothing in this crate
//! ever writes back into the store.

use crate::{NormalizeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the per-event metadata record.
pub const METADATA_FILE: &str = "race_metadata.json";

/// File name of the regular starting-grid side table.
pub const STARTING_GRID_FILE: &str = "starting_grid.json";

/// File name of the sprint starting-grid side table.
pub const SPRINT_GRID_FILE: &str = "sprint_grid.json";

/// One scraped session table: ordered headers, ordered rows of cell strings.
///
/// Rows are aligned to `header` positionally. Short rows are tolerated
/// downstream (cells past the row end read as empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSessionFile {
    /// Session label as reported by the source, e.g. "Qualifying 1".
    #[serde(default)]
    pub session_name: Option<String>,
    /// Ordered column headers.
    #[serde(default)]
    pub header: Vec<String>,
    /// Ordered data rows, each a sequence of cell strings.
    #[serde(default)]
    pub data: Vec<Vec<String>>,
}

impl RawSessionFile {
    /// Position of a header column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Cell value at (row, column), empty-tolerant.
    ///
    /// Returns `None` for out-of-range indices and for empty cells, so
    /// callers treat missing and blank identically.
    pub fn cell<'a>(&self, row: &'a [String], index: usize) -> Option<&'a str> {
        row.get(index).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// Per-event metadata record scraped from the event landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub grand_prix: Option<String>,
    #[serde(default)]
    pub circuit: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Raw date string, single ("27 May 2024") or ranged ("25 - 27 Oct 2024").
    #[serde(default)]
    pub date: Option<String>,
}

/// Load one session table from the store.
pub fn load_session_file(path: &Path) -> Result<RawSessionFile> {
    let contents = fs::read_to_string(path)
        .map_err(|e| NormalizeError::store_error(path.to_path_buf(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| NormalizeError::Json { path: path.to_path_buf(), source: e })
}

/// Load one event-metadata record from the store.
pub fn load_event_metadata(path: &Path) -> Result<EventMetadata> {
    let contents = fs::read_to_string(path)
        .map_err(|e| NormalizeError::store_error(path.to_path_buf(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| NormalizeError::Json { path: path.to_path_buf(), source: e })
}
