//! # Dimension Building
//!
//! This module owns the four dimension tables of the star schema (races,
//! sessions, drivers and teams) and the identity resolution that keeps their
//! synthetic ids stable across eras of source data.
//!
//! ## Ownership
//!
//! Entry creation is centralized: the fact assembler and qualifying combiner
//! may *request* a driver or team id for a name they encounter, but minting
//! goes through the [`IdentityRegistry`] so identifiers stay globally unique.
//! The registry is an explicit value passed by mutable reference, never
//! ambient global state, so tests can substitute an isolated registry.
//!
//! ## Identity resolution
//!
//! Driver display names are the only identity signal in the source, and they
//! are not unique: the documented case is a name shared by a parent and child
//! competing in different decades. Resolution is era-based and explicitly
//! approximate: see [`drivers`] for the cutoff heuristic and
//! [`registry::IdentityRegistry::resolve_driver`] for the policy.

pub mod drivers;
pub mod races;
pub mod registry;
pub mod sessions;
pub mod teams;

pub use drivers::{DriverRecord, normalize_driver_name};
pub use races::{EventRecord, RaceDimension, race_key};
pub use registry::IdentityRegistry;
pub use sessions::{SessionCategory, SessionDimension, SessionRecord};
pub use teams::{TeamRecord, team_id};
