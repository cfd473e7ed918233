//! End-to-end normalization pipeline.
//!
//! One run walks the raw record store, builds the four dimensions, assembles
//! the fact tables, combines qualifying, enforces the qualifying schema and
//! writes the star schema to the output directory. Stages run strictly in
//! that order; each consumes the previous stage's in-memory result.
//!
//! The run is best-effort throughout: unreadable files and unknown labels
//! are skipped with warnings, and only store-root or output failures abort.

use crate::Result;
use crate::dimensions::{IdentityRegistry, RaceDimension, SessionDimension};
use crate::discovery::Discovery;
use crate::facts::grid::{GridTables, event_directories};
use crate::facts::{FactAssembler, FactTables};
use crate::output;
use crate::qualifying::{QualifyingCombiner, enforce_qualifying_schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Where to read the raw store and where to write the star schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
}

/// Row counts of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub races: usize,
    pub sessions: usize,
    pub drivers: usize,
    pub teams: usize,
    /// Fact table name → row count, every table present.
    pub fact_rows: BTreeMap<&'static str, usize>,
}

impl RunSummary {
    pub fn total_fact_rows(&self) -> usize {
        self.fact_rows.values().sum()
    }
}

/// The normalization pipeline.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    /// Run the full pipeline and write the star schema.
    pub fn run(&self) -> Result<RunSummary> {
        info!(data_dir = %self.config.data_dir.display(), "starting normalization run");

        let discovery = Discovery::walk(&self.config.data_dir)?;
        info!(
            session_files = discovery.session_files.len(),
            metadata_files = discovery.metadata_files.len(),
            labels = discovery.header_variants.len(),
            "discovery complete"
        );

        let races = RaceDimension::build(&discovery.metadata_files);
        let sessions =
            SessionDimension::build(discovery.header_variants.keys().map(String::as_str));

        let event_dirs = event_directories(&discovery.session_files, &discovery.metadata_files);
        let grids = GridTables::extract(&event_dirs, &races);

        let mut registry = IdentityRegistry::new();
        let mut tables = FactTables::new();

        FactAssembler::new(&races, &sessions).assemble(
            &discovery.session_files,
            &mut registry,
            &mut tables,
        );
        QualifyingCombiner::new(&races, &sessions, &grids).combine(
            &discovery.session_files,
            &event_dirs,
            &mut registry,
            &mut tables,
        );
        enforce_qualifying_schema(&mut tables);

        output::write_schema(&self.config.out_dir, &races, &sessions, &registry, &tables)?;

        let summary = RunSummary {
            races: races.len(),
            sessions: sessions.records().len(),
            drivers: registry.drivers().len(),
            teams: registry.teams().len(),
            fact_rows: tables
                .iter_all()
                .map(|(kind, rows)| (kind.table_name(), rows.len()))
                .collect(),
        };
        info!(
            races = summary.races,
            drivers = summary.drivers,
            fact_rows = summary.total_fact_rows(),
            "normalization run complete"
        );
        Ok(summary)
    }
}
