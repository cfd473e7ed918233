//! Row-by-row fact assembly for non-qualifying sessions.
//!
//! One fact row per data row, keyed by (race id, session id), with driver
//! and team foreign keys resolved through the identity registry. New driver
//! entries may be minted on demand; events and teams dimension rows are
//! never invented here beyond the registry's own create-or-get.
//!
//! Failure handling: a malformed file or an event missing from the races
//! dimension is skipped with a warning, and the rest of the file set is
//! always processed.

use super::columns::{self, FactKind, is_grid_label, is_qualifying_family};
use super::{FactRow, FactTables};
use crate::dimensions::{IdentityRegistry, RaceDimension, SessionDimension};
use crate::discovery::SessionFileRef;
use crate::store::{self, RawSessionFile};
use serde_json::Value;
use tracing::warn;

/// Assembles the non-qualifying fact tables for one run.
pub struct FactAssembler<'a> {
    races: &'a RaceDimension,
    sessions: &'a SessionDimension,
}

impl<'a> FactAssembler<'a> {
    pub fn new(races: &'a RaceDimension, sessions: &'a SessionDimension) -> Self {
        FactAssembler { races, sessions }
    }

    /// Process every discovered session file except the qualifying family
    /// and grid side-tables, appending rows into `tables`.
    pub fn assemble(
        &self,
        session_files: &[SessionFileRef],
        registry: &mut IdentityRegistry,
        tables: &mut FactTables,
    ) {
        for file_ref in session_files {
            if is_qualifying_family(&file_ref.label) || is_grid_label(&file_ref.label) {
                continue;
            }
            let Some(kind) = columns::fact_kind_for_label(&file_ref.label) else {
                warn!(label = %file_ref.label, path = %file_ref.path.display(),
                    "no fact table for session label, skipping");
                continue;
            };

            let Some(race_id) = self.races.race_id(file_ref.season, &file_ref.event) else {
                warn!(season = file_ref.season, event = %file_ref.event,
                    "event not in races dimension, skipping session file");
                continue;
            };

            let file = match store::load_session_file(&file_ref.path) {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %file_ref.path.display(), error = %e,
                        "skipping unreadable session file");
                    continue;
                }
            };
            if file.header.is_empty() {
                warn!(path = %file_ref.path.display(), "session file has no header, skipping");
                continue;
            }

            let session_id = self.sessions.session_id(&file_ref.label);
            self.assemble_file(&file, file_ref, kind, race_id, session_id, registry, tables);
        }
    }

    fn assemble_file(
        &self,
        file: &RawSessionFile,
        file_ref: &SessionFileRef,
        kind: FactKind,
        race_id: u32,
        session_id: Option<u32>,
        registry: &mut IdentityRegistry,
        tables: &mut FactTables,
    ) {
        let year_idx = file.column_index("Year");
        let nationality_idx = file.column_index("Nationality");

        for row in &file.data {
            // Standings tables carry their own Year column; session tables
            // inherit the season from the store layout.
            let year = year_idx
                .and_then(|idx| file.cell(row, idx))
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(file_ref.season);

            let mut fact = FactRow::new();
            fact.insert("race_id".to_string(), Value::from(race_id));
            if let Some(session_id) = session_id {
                fact.insert("session_id".to_string(), Value::from(session_id));
            }

            for (index, header) in file.header.iter().enumerate() {
                let Some(cell) = file.cell(row, index) else {
                    continue;
                };
                let field = columns::field_for_header(header);
                let value = match field.as_str() {
                    "driver_id" => {
                        let Some(driver_id) = registry.resolve_driver(cell, year) else {
                            continue;
                        };
                        if kind == FactKind::DriverStandings {
                            if let Some(code) =
                                nationality_idx.and_then(|idx| file.cell(row, idx))
                            {
                                registry.backfill_driver_nationality(&driver_id, code);
                            }
                        }
                        Value::from(driver_id)
                    }
                    "team_id" => Value::from(registry.resolve_team(cell)),
                    _ => Value::from(cell),
                };
                fact.insert(field, value);
            }

            tables.push(kind, fact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::MetadataFileRef;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture(
        tmp: &TempDir,
        season: i32,
        event: &str,
        file_name: &str,
        label: &str,
        json: &str,
    ) -> SessionFileRef {
        let dir = tmp.path().join(season.to_string()).join(event);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        fs::write(&path, json).unwrap();
        SessionFileRef {
            season,
            event: event.to_string(),
            path,
            label: label.to_string(),
        }
    }

    fn races_with(season: i32, event: &str) -> RaceDimension {
        RaceDimension::build(&[MetadataFileRef {
            season,
            event: event.to_string(),
            path: PathBuf::from("/nonexistent"),
        }])
    }

    #[test]
    fn practice_file_produces_one_mapped_record_per_row() {
        let tmp = TempDir::new().unwrap();
        let file_ref = fixture(
            &tmp,
            2024,
            "monaco",
            "practice-1.json",
            "Practice 1",
            r#"{
                "session_name": "Practice 1",
                "header": ["Pos", "No", "Driver", "Car", "Time", "Laps"],
                "data": [["1", "1", "Max Verstappen", "Red Bull Racing", "1:12.345", "24"]]
            }"#,
        );
        let races = races_with(2024, "monaco");
        let sessions = SessionDimension::build(["Practice 1"]);
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        FactAssembler::new(&races, &sessions).assemble(
            std::slice::from_ref(&file_ref),
            &mut registry,
            &mut tables,
        );

        let rows = tables.rows(FactKind::PracticeResults);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["practice_result_id"], 1);
        assert_eq!(row["race_id"], 1);
        assert_eq!(row["session_id"], 1);
        assert_eq!(row["position"], "1");
        assert_eq!(row["number"], "1");
        assert_eq!(row["driver_id"], "MAXVER01");
        assert_eq!(row["team_id"], "RED-BUL-RAC");
        assert_eq!(row["time"], "1:12.345");
        assert_eq!(row["laps"], "24");
        // Exactly the mapped fields plus the three keys.
        assert_eq!(row.len(), 9);
    }

    #[test]
    fn unknown_event_is_skipped_with_no_rows() {
        let tmp = TempDir::new().unwrap();
        let file_ref = fixture(
            &tmp,
            2024,
            "monza",
            "race-result.json",
            "Race Result",
            r#"{"header": ["Pos", "Driver"], "data": [["1", "Charles Leclerc"]]}"#,
        );
        let races = races_with(2024, "monaco");
        let sessions = SessionDimension::build(["Race Result"]);
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        FactAssembler::new(&races, &sessions).assemble(
            std::slice::from_ref(&file_ref),
            &mut registry,
            &mut tables,
        );
        assert_eq!(tables.len(FactKind::RaceResults), 0);
    }

    #[test]
    fn qualifying_and_grid_labels_are_left_to_the_combiner() {
        let tmp = TempDir::new().unwrap();
        let refs = vec![
            fixture(
                &tmp,
                2024,
                "monaco",
                "qualifying-1.json",
                "Qualifying 1",
                r#"{"header": ["Pos", "Driver"], "data": [["1", "Max Verstappen"]]}"#,
            ),
            fixture(
                &tmp,
                2024,
                "monaco",
                "starting_grid.json",
                "Starting Grid",
                r#"{"header": ["Pos", "Driver"], "data": [["1", "Max Verstappen"]]}"#,
            ),
        ];
        let races = races_with(2024, "monaco");
        let sessions = SessionDimension::build(["Qualifying"]);
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        FactAssembler::new(&races, &sessions).assemble(&refs, &mut registry, &mut tables);
        for kind in FactKind::ALL {
            assert_eq!(tables.len(kind), 0);
        }
        assert!(registry.drivers().is_empty());
    }

    #[test]
    fn standings_rows_use_embedded_year_and_backfill_nationality() {
        let tmp = TempDir::new().unwrap();
        let file_ref = fixture(
            &tmp,
            2005,
            "season",
            "driver-standings.json",
            "Driver Standings",
            r#"{
                "session_name": "Driver Standings",
                "header": ["Pos", "Driver", "Nationality", "Car", "PTS", "Year"],
                "data": [["1", "Fernando Alonso", "ESP", "Renault", "133", "2005"]]
            }"#,
        );
        let races = races_with(2005, "season");
        let sessions = SessionDimension::build(["Driver Standings"]);
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        FactAssembler::new(&races, &sessions).assemble(
            std::slice::from_ref(&file_ref),
            &mut registry,
            &mut tables,
        );

        let rows = tables.rows(FactKind::DriverStandings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["points"], "133");
        assert_eq!(rows[0]["nationality"], "ESP");
        let driver = &registry.drivers()[0];
        assert_eq!(driver.country_code.as_deref(), Some("ESP"));
        assert_eq!(driver.country.as_deref(), Some("Spain"));
    }

    #[test]
    fn unanticipated_header_falls_through_to_generic_field() {
        let tmp = TempDir::new().unwrap();
        let file_ref = fixture(
            &tmp,
            2024,
            "monaco",
            "fastest-laps.json",
            "Fastest Laps",
            r#"{
                "header": ["Pos", "Driver", "Avg Speed"],
                "data": [["1", "Lando Norris", "231.4"]]
            }"#,
        );
        let races = races_with(2024, "monaco");
        let sessions = SessionDimension::build(["Fastest Laps"]);
        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        FactAssembler::new(&races, &sessions).assemble(
            std::slice::from_ref(&file_ref),
            &mut registry,
            &mut tables,
        );
        assert_eq!(tables.rows(FactKind::FastestLaps)[0]["avg_speed"], "231.4");
    }
}
