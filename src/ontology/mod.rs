//! Validation and instantiation of ontology individuals.
//!
//! Candidates are evaluated against the schema held by a graph store
//! ([`GraphStore`]) and, when free of errors, written into it as named
//! individuals. Every component receives the store handle explicitly.

pub mod candidate;
pub mod entities;
pub mod evaluation;
pub mod identifiers;
pub mod instantiation;
pub mod repositories;
pub mod schema;
pub mod seed;
pub mod service;
pub mod store;
pub mod value_objects;

pub use candidate::{CandidateIndividual, PropertyAssignment, SubmissionContext};
pub use entities::{
    Class, Individual, Ontology, OntologyError, Property, PropertyAssertion, PropertyKind,
};
pub use evaluation::{ConsistencyEvaluator, Evaluation, EvaluationReport, Level, Outcome, Rule};
pub use identifiers::Namespaces;
pub use instantiation::{CommitError, InstantiationCommitter};
pub use repositories::{
    GraphQuery, GraphStore, GraphWrite, ResultSet, StoreError, StoreHandle, WriteReceipt,
};
pub use schema::SchemaQueries;
pub use seed::{OntologyDocument, SeedError};
pub use service::{OntologyService, Submission};
pub use store::InMemoryGraph;
pub use value_objects::{Iri, IriError};
