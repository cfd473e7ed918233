//! Session discovery over the raw record store.
//!
//! Discovery walks the store root once and classifies every JSON file as
//! either a race-session table or an event-metadata record, building:
//!
//! - a map from session label to every distinct header tuple observed for
//!   that label (schema-drift diagnostics; decades of scraping left several
//!   layouts for the "same" session concept)
//! - the flat list of session files with their (season, event) coordinates
//! - the list of event-metadata files
//!
//! Iteration order over seasons and events follows the filesystem and is not
//! sorted; downstream components key by (season, event) rather than relying
//! on position. A file that fails to parse is skipped with a warning;
//! discovery never aborts on a single bad file.

use crate::store::{self, METADATA_FILE};
use crate::{NormalizeError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One discovered session table and its coordinates in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFileRef {
    pub season: i32,
    pub event: String,
    pub path: PathBuf,
    /// Session label, from the file's `session_name` or the file stem.
    pub label: String,
}

/// One discovered event-metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFileRef {
    pub season: i32,
    pub event: String,
    pub path: PathBuf,
}

/// Result of walking the raw record store.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Session label → distinct header tuples observed under that label.
    pub header_variants: BTreeMap<String, BTreeSet<Vec<String>>>,
    pub session_files: Vec<SessionFileRef>,
    pub metadata_files: Vec<MetadataFileRef>,
}

impl Discovery {
    /// Walk the store root and classify every per-event file.
    ///
    /// Non-numeric season directories are skipped silently (the store may
    /// contain bookkeeping directories owned by the retrieval layer).
    /// Returns an error only if the root itself cannot be read.
    pub fn walk(root: &Path) -> Result<Self> {
        let mut discovery = Discovery::default();

        let seasons = fs::read_dir(root)
            .map_err(|e| NormalizeError::store_error(root.to_path_buf(), e))?;

        for season_entry in seasons.flatten() {
            let season_path = season_entry.path();
            if !season_path.is_dir() {
                continue;
            }
            let Some(season) = season_path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<i32>().ok())
            else {
                continue;
            };

            let events = match fs::read_dir(&season_path) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(season, error = %e, "skipping unreadable season directory");
                    continue;
                }
            };

            for event_entry in events.flatten() {
                let event_path = event_entry.path();
                if !event_path.is_dir() {
                    continue;
                }
                let Some(event) = event_path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                discovery.scan_event(season, event, &event_path);
            }
        }

        Ok(discovery)
    }

    fn scan_event(&mut self, season: i32, event: &str, event_path: &Path) {
        let files = match fs::read_dir(event_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(season, event, error = %e, "skipping unreadable event directory");
                return;
            }
        };

        for file_entry in files.flatten() {
            let path = file_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if file_name == METADATA_FILE {
                self.metadata_files.push(MetadataFileRef {
                    season,
                    event: event.to_string(),
                    path,
                });
                continue;
            }

            match store::load_session_file(&path) {
                Ok(file) => {
                    let label = file
                        .session_name
                        .clone()
                        .or_else(|| {
                            path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
                        })
                        .unwrap_or_default();

                    self.header_variants
                        .entry(label.clone())
                        .or_default()
                        .insert(file.header);
                    self.session_files.push(SessionFileRef {
                        season,
                        event: event.to_string(),
                        path,
                        label,
                    });
                }
                Err(e) => {
                    warn!(season, event, path = %path.display(), error = %e,
                        "skipping unparseable session file");
                }
            }
        }
    }
}
