//! Fixed output schema for the qualifying_results table.
//!
//! Combined records originate from either combiner group and from several
//! source eras, so field presence varies row to row. Enforcement projects
//! every row onto one ordered column set with typed coercions, guaranteeing
//! a uniform, analysis-ready table regardless of schema drift.

use crate::facts::{FactKind, FactRow, FactTables};
use serde_json::Value;

/// The fixed, ordered column set of qualifying_results.
pub const QUALIFYING_COLUMNS: [&str; 13] = [
    "qualifying_result_id",
    "race_id",
    "session_id",
    "pos",
    "no",
    "driver_id",
    "team_id",
    "q1",
    "q2",
    "q3",
    "quali_time",
    "laps",
    "starting_grid",
];

/// Rewrite qualifying_results onto the fixed column set.
///
/// Ids are reassigned sequentially from 1, `no` and `laps` are coerced to
/// integers (failures become null, never an error), and the qualifying time
/// is re-derived through the q3 > q2 > q1 fallback as a final safety net.
pub fn enforce_qualifying_schema(tables: &mut FactTables) {
    let enforced: Vec<FactRow> = tables
        .rows(FactKind::QualifyingResults)
        .iter()
        .enumerate()
        .map(|(index, row)| enforce_row(row, index as u64 + 1))
        .collect();
    tables.replace(FactKind::QualifyingResults, enforced);
}

fn enforce_row(row: &FactRow, id: u64) -> FactRow {
    let mut enforced = FactRow::new();
    for column in QUALIFYING_COLUMNS {
        let value = match column {
            "qualifying_result_id" => Value::from(id),
            "no" | "laps" => coerce_integer(row.get(column)),
            "quali_time" => row
                .get(column)
                .filter(|v| !v.is_null())
                .cloned()
                .or_else(|| best_time(row))
                .unwrap_or(Value::Null),
            _ => row.get(column).cloned().unwrap_or(Value::Null),
        };
        enforced.insert(column.to_string(), value);
    }
    enforced
}

/// Best available session time, fastest sub-session first.
fn best_time(row: &FactRow) -> Option<Value> {
    ["q3", "q2", "q1"]
        .iter()
        .find_map(|q| row.get(*q).filter(|v| !v.is_null()).cloned())
}

fn coerce_integer(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Number(n)) => Value::Number(n.clone()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
