//! Star-schema output writer.
//!
//! The run's result is a directory tree of JSON arrays:
//!
//! ```text
//! <out>/dimensions/races.json      sessions.json  drivers.json  teams.json
//! <out>/facts/race_results.json    qualifying_results.json  ...
//! ```
//!
//! Every fact table is written even when empty, so consumers can rely on a
//! fixed file set per run.

use crate::dimensions::{IdentityRegistry, RaceDimension, SessionDimension};
use crate::facts::FactTables;
use crate::{NormalizeError, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// Write the full star schema under `out_dir`.
pub fn write_schema(
    out_dir: &Path,
    races: &RaceDimension,
    sessions: &SessionDimension,
    registry: &IdentityRegistry,
    tables: &FactTables,
) -> Result<()> {
    let dimensions_dir = out_dir.join("dimensions");
    let facts_dir = out_dir.join("facts");
    fs::create_dir_all(&dimensions_dir)
        .map_err(|e| NormalizeError::output_error(dimensions_dir.clone(), e))?;
    fs::create_dir_all(&facts_dir)
        .map_err(|e| NormalizeError::output_error(facts_dir.clone(), e))?;

    write_table(&dimensions_dir.join("races.json"), races.records())?;
    write_table(&dimensions_dir.join("sessions.json"), sessions.records())?;
    write_table(&dimensions_dir.join("drivers.json"), registry.drivers())?;
    write_table(&dimensions_dir.join("teams.json"), registry.teams())?;

    for (kind, rows) in tables.iter_all() {
        let path = facts_dir.join(format!("{}.json", kind.table_name()));
        write_table(&path, rows)?;
    }

    info!(out_dir = %out_dir.display(), "star schema written");
    Ok(())
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file =
        File::create(path).map_err(|e| NormalizeError::output_error(path.to_path_buf(), e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, rows)
        .map_err(|e| NormalizeError::output_error(path.to_path_buf(), e.into()))?;
    Ok(())
}
