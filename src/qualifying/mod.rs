//! # Qualifying Combination
//!
//! Qualifying is the messiest corner of the source data. Depending on era
//! and weekend format, one event's qualifying arrives as up to three
//! fragment files (Q1/Q2/Q3), a single combined session, a sprint variant,
//! or nothing at all except a derived starting-grid table. The combiner
//! merges whatever exists into exactly one record per (event, driver), and
//! the schema enforcer then projects every record onto one fixed column set
//! so the output table is uniform regardless of provenance.

pub mod combiner;
pub mod schema;

pub use combiner::{QualifyingCombiner, QualifyingRecord};
pub use schema::{QUALIFYING_COLUMNS, enforce_qualifying_schema};
