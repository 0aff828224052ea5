//! # Application Error Handling

use crate::{
    config::ConfigError,
    ontology::{CommitError, IriError, OntologyError, SeedError, StoreError},
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Ontology(#[from] OntologyError),

    #[error(transparent)]
    Iri(#[from] IriError),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    JSON(#[from] serde_json::Error),
}

impl Error {
    pub fn msg(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Message(err.to_string())
    }

    /// Flattens a commit failure so that store outages surface as
    /// [`Error::Store`] regardless of which layer observed them.
    #[must_use]
    pub fn from_commit(err: CommitError) -> Self {
        match err {
            CommitError::Store(store) => Self::Store(store),
            other => Self::Commit(other),
        }
    }
}
