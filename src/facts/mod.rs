//! # Fact Assembly
//!
//! Fact tables are append-only collections of measured outcomes keyed by the
//! dimension ids. Rows are loosely shaped JSON objects: the source tables
//! changed layout over the decades, and unanticipated columns fall through
//! to generic field names rather than being dropped.
//!
//! The assembler handles every non-qualifying session family; qualifying
//! fragments and grid side-tables are routed to [`crate::qualifying`] and
//! [`grid`] respectively.

pub mod assembler;
pub mod columns;
pub mod grid;

pub use assembler::FactAssembler;
pub use columns::{FactKind, canonical_field, fact_kind_for_label};
pub use grid::{GridEntry, GridIndex, GridTables};

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A fact row: an ordered set of named values.
pub type FactRow = Map<String, Value>;

/// All fact tables accumulated during a run.
///
/// Row ids are sequential per table starting at 1, monotonically increasing
/// across the whole run: stable within a run, never across runs.
#[derive(Debug, Default)]
pub struct FactTables {
    tables: BTreeMap<FactKind, Vec<FactRow>>,
}

impl FactTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row, assigning the table's next sequential id under the
    /// table's id column name.
    pub fn push(&mut self, kind: FactKind, mut row: FactRow) {
        let table = self.tables.entry(kind).or_default();
        let id = table.len() as u64 + 1;
        // Insert the id first so it leads the serialized row.
        let mut with_id = FactRow::new();
        with_id.insert(kind.id_column().to_string(), Value::from(id));
        with_id.append(&mut row);
        table.push(with_id);
    }

    pub fn rows(&self, kind: FactKind) -> &[FactRow] {
        self.tables.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replace a table's rows wholesale (schema enforcement rewrites
    /// qualifying_results in place).
    pub fn replace(&mut self, kind: FactKind, rows: Vec<FactRow>) {
        self.tables.insert(kind, rows);
    }

    pub fn len(&self, kind: FactKind) -> usize {
        self.tables.get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// Iterate all known tables in a fixed order, including empty ones.
    pub fn iter_all(&self) -> impl Iterator<Item = (FactKind, &[FactRow])> {
        FactKind::ALL.iter().map(|&kind| (kind, self.rows(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_sequential_ids_per_table() {
        let mut tables = FactTables::new();
        tables.push(FactKind::RaceResults, FactRow::new());
        tables.push(FactKind::RaceResults, FactRow::new());
        tables.push(FactKind::PitStops, FactRow::new());

        let race_rows = tables.rows(FactKind::RaceResults);
        assert_eq!(race_rows[0]["race_result_id"], 1);
        assert_eq!(race_rows[1]["race_result_id"], 2);
        assert_eq!(tables.rows(FactKind::PitStops)[0]["pit_stop_id"], 1);
    }

    #[test]
    fn id_column_leads_the_row() {
        let mut tables = FactTables::new();
        let mut row = FactRow::new();
        row.insert("position".to_string(), Value::from("1"));
        tables.push(FactKind::FastestLaps, row);

        let keys: Vec<&String> = tables.rows(FactKind::FastestLaps)[0].keys().collect();
        assert_eq!(keys[0], "fastest_lap_id");
    }

    #[test]
    fn iter_all_includes_empty_tables() {
        let tables = FactTables::new();
        assert_eq!(tables.iter_all().count(), FactKind::ALL.len());
    }
}
