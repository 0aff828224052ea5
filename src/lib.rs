#![allow(clippy::module_name_repetitions)]
//! Validation and instantiation of ontology individuals over a property
//! graph store.
//!
//! A submitted [`ontology::CandidateIndividual`] is checked against the
//! schema stored in a [`ontology::GraphStore`] and, when no check fails,
//! written into that store as a named individual.

pub mod config;
pub mod errors;
pub mod logger;
pub mod ontology;

#[cfg(feature = "cli")]
pub mod cli;

pub use errors::Error;

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
