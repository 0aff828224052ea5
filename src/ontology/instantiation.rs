//! Persists a clean candidate as a named individual.

use std::sync::Arc;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, info};

use super::{
    candidate::{CandidateIndividual, PropertyAssignment},
    entities::PropertyKind,
    identifiers::{self, Namespaces, COMPACT_MARKER},
    repositories::{vocabulary, GraphWrite, StoreError, StoreHandle, WriteReceipt},
};

/// Failures raised while committing a candidate.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The identifier cannot be expressed in the store's compact notation.
    #[error("`{uri}` has no `<base><prefix>#<name>` form")]
    Notation { uri: String },
    /// The assignment declares a property type that cannot be written.
    #[error("property `{property}` declares unsupported type `{kind}`")]
    UnsupportedKind { property: String, kind: String },
    /// A datatype assignment reached the committer without a literal.
    #[error("property `{property}` has no literal value")]
    MissingLiteral { property: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn notation(uri: &str) -> CommitError {
    CommitError::Notation {
        uri: uri.to_string(),
    }
}

/// Writes candidates into the graph store.
///
/// The committer trusts its input: callers evaluate first and only commit
/// candidates without errors.
#[derive(Clone)]
pub struct InstantiationCommitter {
    store: Arc<StoreHandle>,
    namespaces: Namespaces,
}

impl InstantiationCommitter {
    pub fn new(store: Arc<StoreHandle>, namespaces: Namespaces) -> Self {
        Self { store, namespaces }
    }

    /// Upserts the individual node, then writes every assignment concurrently.
    ///
    /// All assignment writes run to completion before the first failure, in
    /// assignment order, is returned. Writes that already succeeded stay in
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError`] when an identifier has no compact form or a
    /// store write fails.
    pub async fn commit(
        &self,
        candidate: &CandidateIndividual,
    ) -> Result<Vec<WriteReceipt>, CommitError> {
        let prefix = identifiers::ontology_of(&candidate.ontology)
            .ok_or_else(|| notation(&candidate.ontology))?;
        let class_name = identifiers::element_of(&candidate.class)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| notation(&candidate.class))?;
        let class_label = format!("{prefix}{COMPACT_MARKER}{class_name}");

        let node = self
            .store
            .write(&GraphWrite::MergeNode {
                uri: candidate.name.clone(),
                labels: vec![
                    vocabulary::RESOURCE.to_string(),
                    vocabulary::OWL_NAMED_INDIVIDUAL.to_string(),
                    class_label,
                ],
            })
            .await?;
        debug!(
            individual = %candidate.name,
            created = node.nodes_created,
            "individual_node_merged"
        );

        let results = join_all(
            candidate
                .properties
                .iter()
                .map(|assignment| self.write_assignment(&candidate.name, prefix, assignment)),
        )
        .await;

        let mut receipts = Vec::with_capacity(results.len() + 1);
        receipts.push(node);
        for result in results {
            receipts.push(result?);
        }

        info!(
            individual = %candidate.name,
            writes = receipts.len(),
            updated = receipts.iter().any(WriteReceipt::contains_updates),
            "individual_committed"
        );
        Ok(receipts)
    }

    async fn write_assignment(
        &self,
        source: &str,
        prefix: &str,
        assignment: &PropertyAssignment,
    ) -> Result<WriteReceipt, CommitError> {
        let element =
            identifiers::element_of(&assignment.name).ok_or_else(|| notation(&assignment.name))?;
        let key = format!("{prefix}{COMPACT_MARKER}{element}");

        let write = match assignment.property_kind() {
            Some(PropertyKind::Object) => {
                let range_label = identifiers::compact_of(&assignment.range)
                    .ok_or_else(|| notation(&assignment.range))?;
                let target = match &assignment.value {
                    Some(target) => target.clone(),
                    None => self.fresh_target(&assignment.range)?,
                };
                GraphWrite::MergeRelation {
                    source: source.to_string(),
                    relation: key,
                    target,
                    target_labels: vec![
                        vocabulary::RESOURCE.to_string(),
                        vocabulary::OWL_NAMED_INDIVIDUAL.to_string(),
                        range_label,
                    ],
                }
            }
            Some(PropertyKind::Datatype) => GraphWrite::SetAttribute {
                uri: source.to_string(),
                key,
                value: assignment
                    .value
                    .clone()
                    .ok_or_else(|| CommitError::MissingLiteral {
                        property: assignment.name.clone(),
                    })?,
            },
            None => {
                return Err(CommitError::UnsupportedKind {
                    property: assignment.name.clone(),
                    kind: assignment.kind.clone(),
                })
            }
        };
        Ok(self.store.write(&write).await?)
    }

    fn fresh_target(&self, range: &str) -> Result<String, CommitError> {
        let prefix = identifiers::ontology_of(range).ok_or_else(|| notation(range))?;
        let class = identifiers::element_of(range)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| notation(range))?;
        Ok(self.namespaces.fresh_individual_uri(prefix, class))
    }
}
