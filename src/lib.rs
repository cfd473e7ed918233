//! Star-schema normalization engine for scraped motorsport results data.
//!
//! Parc Fermé turns a raw record store of per-event JSON tables (decades of
//! scraped Formula 1 results with drifting layouts) into a clean star
//! schema: four dimension tables (races, sessions, drivers, teams) and seven
//! fact tables keyed by their synthetic ids.
//!
//! # Features
//!
//! - **Session Discovery**: One walk over the store classifies every file
//!   and records the distinct header layouts observed per session label
//! - **Identity Resolution**: Deterministic driver and team ids with an
//!   era-based heuristic for name collisions across decades
//! - **Qualifying Combination**: Q1/Q2/Q3 fragments, combined sessions,
//!   sprint variants and grid-only weekends merge into one record per driver
//! - **Schema Enforcement**: The qualifying table is projected onto a fixed,
//!   ordered column set with typed coercions
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use parcferme::{Pipeline, PipelineConfig};
//!
//! fn main() -> parcferme::Result<()> {
//!     let summary = Pipeline::new(PipelineConfig {
//!         data_dir: "data/raw".into(),
//!         out_dir: "data/normalized".into(),
//!     })
//!     .run()?;
//!     println!("{} races, {} fact rows", summary.races, summary.total_fact_rows());
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod store;

// Pipeline stages
pub mod dimensions;
pub mod discovery;
pub mod facts;
pub mod output;
pub mod qualifying;

// Orchestration
pub mod pipeline;

// Core exports
pub use error::*;

// Stage exports
pub use dimensions::{
    DriverRecord, EventRecord, IdentityRegistry, RaceDimension, SessionDimension, SessionRecord,
    TeamRecord,
};
pub use discovery::Discovery;
pub use facts::{FactKind, FactRow, FactTables};
pub use qualifying::{QUALIFYING_COLUMNS, QualifyingCombiner, enforce_qualifying_schema};

// Main API exports
pub use pipeline::{Pipeline, PipelineConfig, RunSummary};
