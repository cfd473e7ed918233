//! Fact-table routing and the versioned header → field mapping.
//!
//! Multiple header layouts exist for the same session concept across eras.
//! Mapping is by header text, never by position, so a new era is supported
//! by adding an entry here without touching assembly or merge logic.

use serde::Serialize;

/// The fact tables the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    RaceResults,
    QualifyingResults,
    PracticeResults,
    FastestLaps,
    PitStops,
    DriverStandings,
    TeamStandings,
}

impl FactKind {
    /// Every table, in output order.
    pub const ALL: [FactKind; 7] = [
        FactKind::RaceResults,
        FactKind::QualifyingResults,
        FactKind::PracticeResults,
        FactKind::FastestLaps,
        FactKind::PitStops,
        FactKind::DriverStandings,
        FactKind::TeamStandings,
    ];

    /// Output file / warehouse table name.
    pub fn table_name(self) -> &'static str {
        match self {
            FactKind::RaceResults => "race_results",
            FactKind::QualifyingResults => "qualifying_results",
            FactKind::PracticeResults => "practice_results",
            FactKind::FastestLaps => "fastest_laps",
            FactKind::PitStops => "pit_stops",
            FactKind::DriverStandings => "driver_standings",
            FactKind::TeamStandings => "team_standings",
        }
    }

    /// Name of the sequential row-id column.
    pub fn id_column(self) -> &'static str {
        match self {
            FactKind::RaceResults => "race_result_id",
            FactKind::QualifyingResults => "qualifying_result_id",
            FactKind::PracticeResults => "practice_result_id",
            FactKind::FastestLaps => "fastest_lap_id",
            FactKind::PitStops => "pit_stop_id",
            FactKind::DriverStandings => "driver_standing_id",
            FactKind::TeamStandings => "team_standing_id",
        }
    }
}

/// Whether a label belongs to the qualifying family (handled by the
/// combiner, never the assembler).
pub fn is_qualifying_family(label: &str) -> bool {
    let lower = label.to_lowercase();
    lower.contains("qualifying") || lower.contains("shootout")
}

/// Whether a label names a grid side-table (consumed as a fallback source,
/// never emitted as standalone facts).
pub fn is_grid_label(label: &str) -> bool {
    label.to_lowercase().contains("grid")
}

/// Select the fact table for a session label, `None` when the label is not a
/// fact-producing session (grid tables, unknown labels).
pub fn fact_kind_for_label(label: &str) -> Option<FactKind> {
    let lower = label.to_lowercase();

    if is_grid_label(label) {
        return None;
    }
    if is_qualifying_family(label) {
        return Some(FactKind::QualifyingResults);
    }
    if lower.contains("standing") {
        if lower.contains("team") || lower.contains("constructor") {
            return Some(FactKind::TeamStandings);
        }
        return Some(FactKind::DriverStandings);
    }
    if lower.contains("practice") || lower.contains("warm up") {
        return Some(FactKind::PracticeResults);
    }
    if lower.contains("race result") || lower.contains("sprint") {
        return Some(FactKind::RaceResults);
    }
    if lower.contains("fastest") {
        return Some(FactKind::FastestLaps);
    }
    if lower.contains("pit stop") {
        return Some(FactKind::PitStops);
    }
    None
}

/// Canonical field name for a known source header.
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let field = match header {
        "Pos" => "position",
        "No" => "number",
        "Driver" => "driver_id",
        "Car" | "Team" => "team_id",
        "Time" => "time",
        "Time/Retired" => "time_retired",
        "Laps" => "laps",
        "Pts" | "PTS" => "points",
        "Q1" => "q1",
        "Q2" => "q2",
        "Q3" => "q3",
        "Gap" => "gap",
        "Lap" => "lap",
        "Stops" => "stops",
        "Total" => "total",
        "Time of day" => "time_of_day",
        "Year" => "year",
        "Nationality" => "nationality",
        "Grand Prix" => "grand_prix",
        _ => return None,
    };
    Some(field)
}

/// Generic fall-through for unanticipated headers: lower snake case.
pub fn fallback_field(header: &str) -> String {
    let mut field = String::with_capacity(header.len());
    let mut last_was_separator = true;
    for c in header.chars() {
        if c.is_ascii_alphanumeric() {
            field.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            field.push('_');
            last_was_separator = true;
        }
    }
    field.trim_end_matches('_').to_string()
}

/// Resolved field name for a header: the canonical mapping or the generic
/// fall-through.
pub fn field_for_header(header: &str) -> String {
    canonical_field(header)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_field(header))
}
