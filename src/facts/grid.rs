//! Starting-grid side tables.
//!
//! Each event directory may carry two well-known files: `starting_grid.json`
//! (the race grid) and `sprint_grid.json` (the sprint grid). They share the
//! session-table shape but are never emitted as standalone facts; the
//! qualifying combiner consumes them as the authoritative source for final
//! grid position and, where present, the qualifying time.

use crate::dimensions::RaceDimension;
use crate::store::{self, RawSessionFile, SPRINT_GRID_FILE, STARTING_GRID_FILE};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Grid data for one (race, driver): final position and the time column the
/// grid page reports, when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridEntry {
    pub position: Option<i64>,
    pub time: Option<String>,
}

/// Per-race map of driver display name to grid entry, for one grid flavor.
///
/// Keyed race-first so lookups borrow the driver name instead of building a
/// composite key per call.
#[derive(Debug, Default)]
pub struct GridIndex {
    entries: HashMap<u32, HashMap<String, GridEntry>>,
}

impl GridIndex {
    pub fn get(&self, race_id: u32, driver_name: &str) -> Option<&GridEntry> {
        self.entries.get(&race_id)?.get(driver_name)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }

    fn absorb(&mut self, race_id: u32, file: &RawSessionFile) {
        let Some(driver_idx) = file.column_index("Driver") else {
            return;
        };
        let Some(pos_idx) = file.column_index("Pos") else {
            return;
        };
        let time_idx = file.column_index("Time");

        let race_entries = self.entries.entry(race_id).or_default();
        for row in &file.data {
            let Some(driver_name) = file.cell(row, driver_idx) else {
                continue;
            };
            let position = file
                .cell(row, pos_idx)
                .and_then(|v| v.parse::<i64>().ok());
            let time = time_idx
                .and_then(|idx| file.cell(row, idx))
                .map(str::to_string);
            race_entries.insert(driver_name.to_string(), GridEntry { position, time });
        }
    }
}

/// Both grid flavors for the whole run.
#[derive(Debug, Default)]
pub struct GridTables {
    pub regular: GridIndex,
    pub sprint: GridIndex,
}

impl GridTables {
    /// Extract grid side tables from every known event directory.
    ///
    /// `event_dirs` maps (season, event) to the event directory; events that
    /// do not resolve to a race id are skipped with a warning, and a grid
    /// file that fails to parse is skipped without aborting the run.
    pub fn extract(
        event_dirs: &HashMap<(i32, String), PathBuf>,
        races: &RaceDimension,
    ) -> Self {
        let mut tables = GridTables::default();

        for ((season, event), dir) in event_dirs {
            let Some(race_id) = races.race_id(*season, event) else {
                warn!(season, event = %event, "no race id for event, skipping grid tables");
                continue;
            };
            absorb_file(&mut tables.regular, dir.join(STARTING_GRID_FILE), race_id);
            absorb_file(&mut tables.sprint, dir.join(SPRINT_GRID_FILE), race_id);
        }

        tables
    }

    /// Whether an event directory carries a sprint grid file at all.
    pub fn sprint_grid_path(dir: &Path) -> Option<PathBuf> {
        let path = dir.join(SPRINT_GRID_FILE);
        path.exists().then_some(path)
    }
}

fn absorb_file(index: &mut GridIndex, path: PathBuf, race_id: u32) {
    if !path.exists() {
        return;
    }
    match store::load_session_file(&path) {
        Ok(file) => index.absorb(race_id, &file),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable grid file");
        }
    }
}

/// Collect the distinct event directories seen during discovery.
pub fn event_directories(
    session_files: &[crate::discovery::SessionFileRef],
    metadata_files: &[crate::discovery::MetadataFileRef],
) -> HashMap<(i32, String), PathBuf> {
    let mut dirs: HashMap<(i32, String), PathBuf> = HashMap::new();

    let mut insert = |season: i32, event: &str, path: &Path| {
        if let Some(parent) = path.parent() {
            dirs.entry((season, event.to_string()))
                .or_insert_with(|| parent.to_path_buf());
        }
    };

    for file_ref in metadata_files {
        insert(file_ref.season, &file_ref.event, &file_ref.path);
    }
    for file_ref in session_files {
        insert(file_ref.season, &file_ref.event, &file_ref.path);
    }
    dirs
}
