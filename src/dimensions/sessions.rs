//! Sessions dimension: one record per canonical session kind.
//!
//! The dimension is built from the set of distinct session labels observed
//! during discovery, minus the labels that the qualifying combiner merges
//! away ("Qualifying 1", "Overall Qualifying", grid tables). Ordering is by
//! (category, intra-category sequence) so the dimension reads in weekend
//! order regardless of filesystem iteration order.

use serde::{Deserialize, Serialize};

/// Broad kind of a session, in weekend order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCategory {
    Practice,
    Qualifying,
    Sprint,
    Race,
    Other,
}

/// One row of the sessions dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: u32,
    pub session_name: String,
    pub category: SessionCategory,
    /// Ordering key within the category.
    pub session_order: u32,
}

/// The sessions dimension.
#[derive(Debug, Default)]
pub struct SessionDimension {
    records: Vec<SessionRecord>,
}

/// Classify a session label into its category.
pub fn category_of(label: &str) -> SessionCategory {
    let lower = label.to_lowercase();
    if lower.contains("sprint") {
        SessionCategory::Sprint
    } else if lower.contains("qualifying") || lower.contains("shootout") {
        SessionCategory::Qualifying
    } else if lower.contains("practice") {
        SessionCategory::Practice
    } else if lower.contains("warm")
        || lower.contains("grid")
        || lower.contains("race")
        || lower.contains("fastest")
        || lower.contains("pit stop")
    {
        SessionCategory::Race
    } else {
        SessionCategory::Other
    }
}

/// Ordering key for a label within its category.
///
/// Embedded digits win where present ("Practice 3" → 3); otherwise a fixed
/// keyword priority applies. Within the race category: warm-up, starting
/// grid, race result, fastest laps, pit stops.
pub fn sequence_of(label: &str) -> u32 {
    let lower = label.to_lowercase();
    if let Some(digit) = lower.chars().find_map(|c| c.to_digit(10)) {
        return digit;
    }
    match category_of(label) {
        SessionCategory::Practice => 0,
        SessionCategory::Qualifying => {
            if lower.contains("overall") {
                9
            } else {
                0
            }
        }
        SessionCategory::Sprint => {
            if lower.contains("qualifying") {
                0
            } else if lower.contains("shootout") {
                1
            } else if lower.contains("grid") {
                2
            } else {
                3
            }
        }
        SessionCategory::Race => {
            if lower.contains("warm") {
                0
            } else if lower.contains("grid") {
                1
            } else if lower.contains("race") {
                2
            } else if lower.contains("fastest") {
                3
            } else {
                4
            }
        }
        SessionCategory::Other => 0,
    }
}

/// Whether the combiner merges this label away rather than keeping it as a
/// standalone session kind.
///
/// Sub-session qualifying fragments ("Qualifying 1", "Overall Qualifying",
/// numbered shootouts) and grid side-tables never appear in the dimension;
/// their data surfaces through the combined qualifying record instead.
pub fn is_merged_away(label: &str) -> bool {
    let lower = label.to_lowercase();
    if lower.contains("grid") {
        return true;
    }
    if lower.contains("qualifying") || lower.contains("shootout") {
        return lower.chars().any(|c| c.is_ascii_digit()) || lower.contains("overall");
    }
    false
}

impl SessionDimension {
    /// Build the dimension from the distinct labels observed in discovery.
    pub fn build<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut kept: Vec<&str> = labels
            .into_iter()
            .filter(|label| !label.is_empty() && !is_merged_away(label))
            .collect();
        kept.sort_unstable();
        kept.dedup();
        // Alphabetical pre-sort above makes the (category, sequence) sort a
        // stable total order for labels that tie.
        kept.sort_by_key(|label| (category_of(label), sequence_of(label)));

        let records = kept
            .into_iter()
            .enumerate()
            .map(|(index, label)| SessionRecord {
                session_id: index as u32 + 1,
                session_name: label.to_string(),
                category: category_of(label),
                session_order: sequence_of(label),
            })
            .collect();
        SessionDimension { records }
    }

    /// Resolve a session label to its id, exact match only.
    pub fn session_id(&self, label: &str) -> Option<u32> {
        self.records
            .iter()
            .find(|r| r.session_name == label)
            .map(|r| r.session_id)
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }
}
