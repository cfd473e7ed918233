//! Create-or-get identity registry for drivers and teams.
//!
//! The registry is the single place where driver and team entries are
//! minted. The fact assembler and qualifying combiner both hold a `&mut`
//! reference to one registry for the whole run, so a name discovered in two
//! different event files still resolves to one id.

use super::drivers::{
    self, DriverRecord, EARLY_ERA_CUTOFF, LATE_ERA_CUTOFF, driver_base_id,
    driver_id_with_suffix, name_variants, normalize_driver_name,
};
use super::teams::{TeamRecord, team_id};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Mutable identity maps for a single pipeline run.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    driver_records: Vec<DriverRecord>,
    /// Lowercased name variant → indices into `driver_records`, in mint order.
    driver_variants: HashMap<String, Vec<usize>>,
    driver_ids: HashSet<String>,
    /// (lowercased name, year) → resolved driver id.
    resolution_cache: HashMap<(String, i32), String>,
    team_records: Vec<TeamRecord>,
    team_index: HashMap<String, usize>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a display name and contextual year to a driver id, minting a
    /// new entry when the name is unknown. Returns `None` only for blank
    /// names.
    ///
    /// For a name with exactly one known id the year is irrelevant. For a
    /// shared name the era heuristic applies: at or before the early cutoff
    /// the earliest-assigned id wins, after the late cutoff the latest,
    /// anything between falls back to the earliest. Approximate by design;
    /// the source offers no authoritative signal.
    pub fn resolve_driver(&mut self, name: &str, year: i32) -> Option<String> {
        let normalized = normalize_driver_name(name);
        if normalized.is_empty() {
            return None;
        }

        let cache_key = (normalized.to_lowercase(), year);
        if let Some(id) = self.resolution_cache.get(&cache_key) {
            return Some(id.clone());
        }

        let id = match self.find_candidates(&normalized) {
            candidates if candidates.is_empty() => self.register_driver(&normalized),
            candidates if candidates.len() == 1 => {
                self.driver_records[candidates[0]].driver_id.clone()
            }
            candidates => {
                let index = if year <= EARLY_ERA_CUTOFF {
                    candidates[0]
                } else if year > LATE_ERA_CUTOFF {
                    candidates[candidates.len() - 1]
                } else {
                    candidates[0]
                };
                let id = self.driver_records[index].driver_id.clone();
                debug!(name = %normalized, year, resolved = %id,
                    "era heuristic applied to shared driver name");
                id
            }
        };

        self.resolution_cache.insert(cache_key, id.clone());
        Some(id)
    }

    /// Mint a new driver entry for this display name, even when the name is
    /// already registered. Used when an authoritative source knows two real
    /// people share the name; session-file resolution goes through
    /// [`Self::resolve_driver`] instead.
    pub fn register_driver(&mut self, name: &str) -> String {
        let normalized = normalize_driver_name(name);
        let base = driver_base_id(&normalized);

        let mut suffix = 1;
        let driver_id = loop {
            let candidate = driver_id_with_suffix(&base, suffix);
            if !self.driver_ids.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };

        let index = self.driver_records.len();
        self.driver_records.push(DriverRecord {
            driver_id: driver_id.clone(),
            driver_name: normalized.clone(),
            country_code: None,
            country: None,
        });
        self.driver_ids.insert(driver_id.clone());
        for variant in name_variants(&normalized) {
            self.driver_variants.entry(variant).or_default().push(index);
        }
        driver_id
    }

    /// Indices of registered drivers matching any permutation variant of the
    /// name, in mint order (mint order is also suffix order for a shared
    /// name).
    fn find_candidates(&self, normalized: &str) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for variant in name_variants(normalized) {
            if let Some(indices) = self.driver_variants.get(&variant) {
                for &index in indices {
                    if seen.insert(index) {
                        candidates.push(index);
                    }
                }
            }
        }
        candidates.sort_unstable();
        candidates
    }

    /// Resolve a team display name to its deterministic id, registering the
    /// name on first sight. If two display names collapse onto one computed
    /// id the first registrant keeps the row.
    pub fn resolve_team(&mut self, name: &str) -> String {
        let id = team_id(name);
        if !self.team_index.contains_key(&id) {
            self.team_index.insert(id.clone(), self.team_records.len());
            self.team_records.push(TeamRecord {
                team_id: id.clone(),
                team_name: name.to_string(),
            });
        }
        id
    }

    /// Attach nationality to a driver entry, first write wins.
    pub fn backfill_driver_nationality(&mut self, driver_id: &str, code: &str) {
        if code.is_empty() {
            return;
        }
        if let Some(record) = self
            .driver_records
            .iter_mut()
            .find(|r| r.driver_id == driver_id)
        {
            if record.country_code.is_none() {
                record.country_code = Some(code.to_uppercase());
                record.country = Some(drivers::country_name(code));
            }
        }
    }

    pub fn drivers(&self) -> &[DriverRecord] {
        &self.driver_records
    }

    pub fn teams(&self) -> &[TeamRecord] {
        &self.team_records
    }
}
