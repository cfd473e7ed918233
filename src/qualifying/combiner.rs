//! Merging fragmented qualifying files into one record per driver.
//!
//! The merge is an explicit pipeline with a fixed field-priority order so
//! the "first non-empty wins" invariant stays auditable:
//!
//! 1. Partition an event's qualifying-family files into sprint and regular
//!    groups by label.
//! 2. A sprint grid with no sprint-qualifying fragments synthesizes a
//!    pseudo-qualifying table so the merge below is uniform.
//! 3. Union the driver names across the group's fragments.
//! 4. Per driver, seed starting grid position and time from the grid side
//!    table; the dedicated grid file is authoritative and must win over
//!    anything inferred from fragment time columns.
//! 5. Walk fragments in priority order (combined first, then Q1, Q2, Q3)
//!    filling still-empty fields only.
//! 6. Fall back to the best of q3 > q2 > q1 for the qualifying time.
//! 7. Drop drivers whose name cannot be resolved to an id.

use crate::dimensions::{IdentityRegistry, RaceDimension, SessionDimension};
use crate::discovery::SessionFileRef;
use crate::facts::columns::is_qualifying_family;
use crate::facts::grid::{GridIndex, GridTables};
use crate::facts::{FactKind, FactRow, FactTables};
use crate::store::{self, RawSessionFile};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::{debug, warn};

/// One combined qualifying record, one per (group, driver).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualifyingRecord {
    pub race_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u32>,
    pub driver_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quali_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laps: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_grid: Option<i64>,
}

/// Fragment priority: combined/overall sessions first, then Q1, Q2, Q3,
/// detected from the digit embedded in the label.
fn fragment_slot(label: &str) -> u32 {
    let lower = label.to_lowercase();
    if lower.contains('1') {
        1
    } else if lower.contains('2') {
        2
    } else if lower.contains('3') {
        3
    } else {
        0
    }
}

/// Merges qualifying fragments for every event in the run.
pub struct QualifyingCombiner<'a> {
    races: &'a RaceDimension,
    sessions: &'a SessionDimension,
    grids: &'a GridTables,
}

impl<'a> QualifyingCombiner<'a> {
    pub fn new(
        races: &'a RaceDimension,
        sessions: &'a SessionDimension,
        grids: &'a GridTables,
    ) -> Self {
        QualifyingCombiner { races, sessions, grids }
    }

    /// Combine all qualifying-family files and append the records to the
    /// qualifying_results table.
    ///
    /// `event_dirs` covers every event seen in discovery, including those
    /// with no qualifying fragments at all: a sprint grid alone still
    /// yields synthesized records.
    pub fn combine(
        &self,
        session_files: &[SessionFileRef],
        event_dirs: &HashMap<(i32, String), PathBuf>,
        registry: &mut IdentityRegistry,
        tables: &mut FactTables,
    ) {
        // Keyed map, not positional: discovery order is unspecified.
        let mut fragments_by_event: BTreeMap<(i32, String), Vec<&SessionFileRef>> =
            BTreeMap::new();
        for file_ref in session_files {
            if is_qualifying_family(&file_ref.label) {
                fragments_by_event
                    .entry((file_ref.season, file_ref.event.clone()))
                    .or_default()
                    .push(file_ref);
            }
        }

        let mut events: BTreeSet<(i32, String)> = fragments_by_event.keys().cloned().collect();
        events.extend(event_dirs.keys().cloned());

        for (season, event) in events {
            let Some(race_id) = self.races.race_id(season, &event) else {
                warn!(season, event = %event, "no race id for event, skipping qualifying");
                continue;
            };

            let mut sprint_fragments: Vec<(String, RawSessionFile)> = Vec::new();
            let mut regular_fragments: Vec<(String, RawSessionFile)> = Vec::new();

            for file_ref in fragments_by_event
                .get(&(season, event.clone()))
                .map(Vec::as_slice)
                .unwrap_or_default()
            {
                let file = match store::load_session_file(&file_ref.path) {
                    Ok(file) => file,
                    Err(e) => {
                        warn!(path = %file_ref.path.display(), error = %e,
                            "skipping unreadable qualifying fragment");
                        continue;
                    }
                };
                if file_ref.label.to_lowercase().contains("sprint") {
                    sprint_fragments.push((file_ref.label.clone(), file));
                } else {
                    regular_fragments.push((file_ref.label.clone(), file));
                }
            }

            // Sprint weekends before the qualifying format settled have no
            // sprint-qualifying file at all, only the derived grid.
            if sprint_fragments.is_empty() {
                if let Some(grid_path) = event_dirs
                    .get(&(season, event.clone()))
                    .and_then(|dir| GridTables::sprint_grid_path(dir))
                {
                    match store::load_session_file(&grid_path) {
                        Ok(grid_file) => {
                            debug!(season, event = %event,
                                "no sprint qualifying file, synthesizing from sprint grid");
                            sprint_fragments.push((
                                "Sprint Qualifying".to_string(),
                                synthesize_from_grid(&grid_file),
                            ));
                        }
                        Err(e) => {
                            warn!(path = %grid_path.display(), error = %e,
                                "skipping unreadable sprint grid");
                        }
                    }
                }
            }

            if !sprint_fragments.is_empty() {
                let session_id = self
                    .sessions
                    .session_id(&sprint_fragments[0].0)
                    .or_else(|| self.sessions.session_id("Sprint Qualifying"));
                self.merge_group(
                    sprint_fragments,
                    race_id,
                    season,
                    session_id,
                    &self.grids.sprint,
                    registry,
                    tables,
                );
            }
            if !regular_fragments.is_empty() {
                let session_id = self.sessions.session_id("Qualifying");
                self.merge_group(
                    regular_fragments,
                    race_id,
                    season,
                    session_id,
                    &self.grids.regular,
                    registry,
                    tables,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_group(
        &self,
        mut fragments: Vec<(String, RawSessionFile)>,
        race_id: u32,
        season: i32,
        session_id: Option<u32>,
        grid: &GridIndex,
        registry: &mut IdentityRegistry,
        tables: &mut FactTables,
    ) {
        fragments.sort_by_key(|(label, _)| fragment_slot(label));

        let mut driver_names: BTreeSet<String> = BTreeSet::new();
        for (_, file) in &fragments {
            if let Some(driver_idx) = file.column_index("Driver") {
                for row in &file.data {
                    if let Some(name) = file.cell(row, driver_idx) {
                        driver_names.insert(name.to_string());
                    }
                }
            }
        }

        for driver_name in driver_names {
            let Some(driver_id) = registry.resolve_driver(&driver_name, season) else {
                continue;
            };

            let mut record = QualifyingRecord {
                race_id,
                session_id,
                driver_id,
                ..QualifyingRecord::default()
            };

            // Grid data first: the dedicated grid file is authoritative for
            // the final position and must win over time-column inference.
            if let Some(entry) = grid.get(race_id, &driver_name) {
                record.starting_grid = entry.position;
                record.quali_time = entry.time.clone();
            }

            for (label, file) in &fragments {
                self.merge_fragment(&mut record, label, file, &driver_name, registry);
            }

            if record.quali_time.is_none() {
                record.quali_time = record
                    .q3
                    .clone()
                    .or_else(|| record.q2.clone())
                    .or_else(|| record.q1.clone());
            }

            tables.push(FactKind::QualifyingResults, record_to_row(&record));
        }
    }

    /// Fill still-empty fields of `record` from the driver's row in one
    /// fragment. Later fragments never overwrite.
    fn merge_fragment(
        &self,
        record: &mut QualifyingRecord,
        label: &str,
        file: &RawSessionFile,
        driver_name: &str,
        registry: &mut IdentityRegistry,
    ) {
        let Some(driver_idx) = file.column_index("Driver") else {
            return;
        };
        let Some(row) = file
            .data
            .iter()
            .find(|row| row.get(driver_idx).map(String::as_str) == Some(driver_name))
        else {
            return;
        };

        for (index, header) in file.header.iter().enumerate() {
            let Some(value) = file.cell(row, index) else {
                continue;
            };
            match header.as_str() {
                "Pos" => fill(&mut record.pos, value),
                "No" => fill(&mut record.no, value),
                "Car" | "Team" => {
                    if record.team_id.is_none() {
                        record.team_id = Some(registry.resolve_team(value));
                    }
                }
                "Laps" => fill(&mut record.laps, value),
                "Q1" => fill(&mut record.q1, value),
                "Q2" => fill(&mut record.q2, value),
                "Q3" => fill(&mut record.q3, value),
                // Older table format: one Time column, no Q1/Q2/Q3 split.
                // Route by which fragment it came from; the combined
                // session's time is the qualifying time itself.
                "Time" => match fragment_slot(label) {
                    1 => fill(&mut record.q1, value),
                    2 => fill(&mut record.q2, value),
                    3 => fill(&mut record.q3, value),
                    _ => fill(&mut record.quali_time, value),
                },
                _ => {}
            }
        }
    }
}

fn fill(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn record_to_row(record: &QualifyingRecord) -> FactRow {
    match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => FactRow::new(),
    }
}

/// Convert a sprint-grid table into a pseudo-qualifying table with the
/// standard qualifying columns, Q1/Q2/Q3 and Laps left empty.
fn synthesize_from_grid(grid_file: &RawSessionFile) -> RawSessionFile {
    const HEADER: [&str; 9] = ["Pos", "No", "Driver", "Car", "Q1", "Q2", "Q3", "Time", "Laps"];

    let pos_idx = grid_file.column_index("Pos");
    let no_idx = grid_file.column_index("No");
    let driver_idx = grid_file.column_index("Driver");
    let car_idx = grid_file.column_index("Car");
    let time_idx = grid_file.column_index("Time");

    let copy = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    let data = grid_file
        .data
        .iter()
        .filter(|row| row.first().is_some_and(|cell| !cell.is_empty()))
        .map(|row| {
            vec![
                copy(row, pos_idx),
                copy(row, no_idx),
                copy(row, driver_idx),
                copy(row, car_idx),
                String::new(),
                String::new(),
                String::new(),
                copy(row, time_idx),
                String::new(),
            ]
        })
        .collect();

    RawSessionFile {
        session_name: Some("Sprint Qualifying".to_string()),
        header: HEADER.iter().map(|h| h.to_string()).collect(),
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::MetadataFileRef;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn races_with(season: i32, event: &str) -> RaceDimension {
        RaceDimension::build(&[MetadataFileRef {
            season,
            event: event.to_string(),
            path: PathBuf::from("/nonexistent"),
        }])
    }

    fn write_fragment(
        dir: &Path,
        file_name: &str,
        label: &str,
        header: &[&str],
        rows: &[&[&str]],
    ) -> SessionFileRef {
        let file = RawSessionFile {
            session_name: Some(label.to_string()),
            header: header.iter().map(|h| h.to_string()).collect(),
            data: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        };
        let path = dir.join(file_name);
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();
        let season: i32 = dir
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse().ok())
            .unwrap();
        SessionFileRef {
            season,
            event: dir.file_name().unwrap().to_str().unwrap().to_string(),
            path,
            label: label.to_string(),
        }
    }

    fn event_dir(tmp: &TempDir, season: i32, event: &str) -> PathBuf {
        let dir = tmp.path().join(season.to_string()).join(event);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn dirs_for(season: i32, event: &str, dir: &Path) -> HashMap<(i32, String), PathBuf> {
        HashMap::from([((season, event.to_string()), dir.to_path_buf())])
    }

    #[test]
    fn fragment_priority_puts_combined_first() {
        assert_eq!(fragment_slot("Qualifying"), 0);
        assert_eq!(fragment_slot("Overall Qualifying"), 0);
        assert_eq!(fragment_slot("Qualifying 1"), 1);
        assert_eq!(fragment_slot("Qualifying 2"), 2);
        assert_eq!(fragment_slot("Qualifying 3"), 3);
    }

    #[test]
    fn q1_and_q3_fragments_merge_into_one_record() {
        let tmp = TempDir::new().unwrap();
        let dir = event_dir(&tmp, 2003, "imola");
        let header = ["Pos", "No", "Driver", "Car", "Time", "Laps"];
        let refs = vec![
            write_fragment(
                &dir,
                "qualifying-1.json",
                "Qualifying 1",
                &header,
                &[&["3", "7", "Jarno Trulli", "Renault", "1:30.000", "11"]],
            ),
            write_fragment(
                &dir,
                "qualifying-3.json",
                "Qualifying 3",
                &header,
                &[&["1", "7", "Jarno Trulli", "Renault", "1:28.500", "12"]],
            ),
        ];
        let races = races_with(2003, "imola");
        let sessions = SessionDimension::build(["Qualifying"]);
        let grids = GridTables::default();
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        QualifyingCombiner::new(&races, &sessions, &grids).combine(
            &refs,
            &dirs_for(2003, "imola", &dir),
            &mut registry,
            &mut tables,
        );

        let rows = tables.rows(FactKind::QualifyingResults);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["q1"], "1:30.000");
        assert!(row.get("q2").is_none());
        assert_eq!(row["q3"], "1:28.500");
        assert_eq!(row["quali_time"], "1:28.500");
        // First non-empty wins: the Q1 fragment came first in priority order.
        assert_eq!(row["pos"], "3");
        assert_eq!(row["laps"], "11");
    }

    #[test]
    fn explicit_q_columns_fill_directly() {
        let tmp = TempDir::new().unwrap();
        let dir = event_dir(&tmp, 2024, "monaco");
        let refs = vec![write_fragment(
            &dir,
            "qualifying.json",
            "Qualifying",
            &["Pos", "No", "Driver", "Car", "Q1", "Q2", "Q3", "Laps"],
            &[&["1", "16", "Charles Leclerc", "Ferrari", "1:11.6", "1:10.8", "1:10.2", "27"]],
        )];
        let races = races_with(2024, "monaco");
        let sessions = SessionDimension::build(["Qualifying"]);
        let grids = GridTables::default();
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        QualifyingCombiner::new(&races, &sessions, &grids).combine(
            &refs,
            &dirs_for(2024, "monaco", &dir),
            &mut registry,
            &mut tables,
        );

        let row = &tables.rows(FactKind::QualifyingResults)[0];
        assert_eq!(row["q3"], "1:10.2");
        assert_eq!(row["quali_time"], "1:10.2");
        assert_eq!(row["session_id"], 1);
        assert_eq!(row["team_id"], "FER");
    }

    #[test]
    fn sprint_grid_alone_synthesizes_one_record_per_grid_row() {
        let tmp = TempDir::new().unwrap();
        let dir = event_dir(&tmp, 2021, "silverstone");
        let grid = RawSessionFile {
            session_name: Some("Sprint Grid".to_string()),
            header: vec!["Pos".into(), "No".into(), "Driver".into(), "Car".into(), "Time".into()],
            data: vec![
                vec!["1".into(), "44".into(), "Lewis Hamilton".into(), "Mercedes".into(), "1:26.1".into()],
                vec!["2".into(), "33".into(), "Max Verstappen".into(), "Red Bull".into(), "1:26.3".into()],
            ],
        };
        fs::write(
            dir.join("sprint_grid.json"),
            serde_json::to_string(&grid).unwrap(),
        )
        .unwrap();

        let races = races_with(2021, "silverstone");
        let sessions = SessionDimension::build(["Sprint Qualifying"]);
        let event_dirs = dirs_for(2021, "silverstone", &dir);
        let grids = GridTables::extract(&event_dirs, &races);
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        QualifyingCombiner::new(&races, &sessions, &grids).combine(
            &[],
            &event_dirs,
            &mut registry,
            &mut tables,
        );

        let rows = tables.rows(FactKind::QualifyingResults);
        assert_eq!(rows.len(), 2);
        let hamilton = rows
            .iter()
            .find(|r| r["driver_id"] == "LEWHAM01")
            .unwrap();
        assert_eq!(hamilton["starting_grid"], 1);
        assert_eq!(hamilton["quali_time"], "1:26.1");
        assert!(hamilton.get("q1").is_none());
        assert!(hamilton.get("laps").is_none());
    }

    #[test]
    fn grid_time_wins_over_fragment_time_column() {
        let tmp = TempDir::new().unwrap();
        let dir = event_dir(&tmp, 1998, "spa");
        let grid = RawSessionFile {
            session_name: Some("Starting Grid".to_string()),
            header: vec!["Pos".into(), "Driver".into(), "Time".into()],
            data: vec![vec!["4".into(), "Damon Hill".into(), "1:50.0".into()]],
        };
        fs::write(
            dir.join("starting_grid.json"),
            serde_json::to_string(&grid).unwrap(),
        )
        .unwrap();
        let refs = vec![write_fragment(
            &dir,
            "qualifying.json",
            "Qualifying",
            &["Pos", "Driver", "Time"],
            &[&["3", "Damon Hill", "1:51.2"]],
        )];

        let races = races_with(1998, "spa");
        let sessions = SessionDimension::build(["Qualifying"]);
        let event_dirs = dirs_for(1998, "spa", &dir);
        let grids = GridTables::extract(&event_dirs, &races);
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        QualifyingCombiner::new(&races, &sessions, &grids).combine(
            &refs,
            &event_dirs,
            &mut registry,
            &mut tables,
        );

        let row = &tables.rows(FactKind::QualifyingResults)[0];
        assert_eq!(row["quali_time"], "1:50.0");
        assert_eq!(row["starting_grid"], 4);
        // The fragment still supplies the session position.
        assert_eq!(row["pos"], "3");
    }

    #[test]
    fn record_count_equals_distinct_resolvable_driver_names() {
        let tmp = TempDir::new().unwrap();
        let dir = event_dir(&tmp, 2006, "suzuka");
        let header = ["Pos", "Driver", "Time"];
        let refs = vec![
            write_fragment(
                &dir,
                "qualifying-1.json",
                "Qualifying 1",
                &header,
                &[
                    &["1", "Fernando Alonso", "1:31.0"],
                    &["2", "Michael Schumacher", "1:31.2"],
                ],
            ),
            write_fragment(
                &dir,
                "qualifying-2.json",
                "Qualifying 2",
                &header,
                &[
                    &["1", "Michael Schumacher", "1:30.1"],
                    &["2", "Felipe Massa", "1:30.4"],
                ],
            ),
        ];
        let races = races_with(2006, "suzuka");
        let sessions = SessionDimension::build(["Qualifying"]);
        let grids = GridTables::default();
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        QualifyingCombiner::new(&races, &sessions, &grids).combine(
            &refs,
            &dirs_for(2006, "suzuka", &dir),
            &mut registry,
            &mut tables,
        );

        // Union of distinct names across fragments, one record each.
        assert_eq!(tables.len(FactKind::QualifyingResults), 3);
    }

    #[test]
    fn sprint_and_regular_groups_stay_independent() {
        let tmp = TempDir::new().unwrap();
        let dir = event_dir(&tmp, 2023, "baku");
        let header = ["Pos", "Driver", "Q1", "Q2", "Q3"];
        let refs = vec![
            write_fragment(
                &dir,
                "qualifying.json",
                "Qualifying",
                &header,
                &[&["1", "Charles Leclerc", "1:41.3", "1:41.0", "1:40.2"]],
            ),
            write_fragment(
                &dir,
                "sprint-shootout.json",
                "Sprint Shootout",
                &header,
                &[&["1", "Charles Leclerc", "1:42.2", "1:41.9", "1:41.7"]],
            ),
        ];
        let races = races_with(2023, "baku");
        let sessions = SessionDimension::build(["Qualifying", "Sprint Shootout"]);
        let grids = GridTables::default();
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        QualifyingCombiner::new(&races, &sessions, &grids).combine(
            &refs,
            &dirs_for(2023, "baku", &dir),
            &mut registry,
            &mut tables,
        );

        let rows = tables.rows(FactKind::QualifyingResults);
        assert_eq!(rows.len(), 2);
        let times: BTreeSet<&str> = rows
            .iter()
            .map(|r| r["quali_time"].as_str().unwrap())
            .collect();
        assert_eq!(times, BTreeSet::from(["1:40.2", "1:41.7"]));
    }

    #[test]
    fn synthesized_grid_skips_rows_with_empty_leading_cell() {
        let grid = RawSessionFile {
            session_name: None,
            header: vec!["Pos".into(), "No".into(), "Driver".into(), "Car".into(), "Time".into()],
            data: vec![
                vec!["1".into(), "4".into(), "Lando Norris".into(), "McLaren".into(), "1:20.0".into()],
                vec!["".into(), "".into(), "".into(), "".into(), "".into()],
            ],
        };
        let synthesized = synthesize_from_grid(&grid);
        assert_eq!(synthesized.header.len(), 9);
        assert_eq!(synthesized.data.len(), 1);
        assert_eq!(synthesized.data[0][2], "Lando Norris");
        assert_eq!(synthesized.data[0][7], "1:20.0");
        assert_eq!(synthesized.data[0][4], "");
    }
}
