use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::{
    config::{Config, StoreBackend},
    ontology::{
        candidate::{CandidateIndividual, SubmissionContext},
        evaluation::{ConsistencyEvaluator, Evaluation, EvaluationReport},
        identifiers::Namespaces,
        instantiation::InstantiationCommitter,
        repositories::{StoreHandle, WriteReceipt},
        seed::OntologyDocument,
        store::InMemoryGraph,
    },
    Error, Result,
};

/// Response to a submission.
///
/// Serializes to `{"warnings": [...]}` when the individual was committed and
/// to `{"warnings": [...], "errors": [...]}` when it was rejected.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Submission {
    Rejected {
        warnings: Vec<Evaluation>,
        errors: Vec<Evaluation>,
    },
    Committed {
        warnings: Vec<Evaluation>,
        #[serde(skip_serializing)]
        receipts: Vec<WriteReceipt>,
    },
}

impl Submission {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    #[must_use]
    pub fn warnings(&self) -> &[Evaluation] {
        match self {
            Self::Rejected { warnings, .. } | Self::Committed { warnings, .. } => warnings,
        }
    }
}

/// Entry point wiring the evaluator and the committer to one store handle.
#[derive(Clone)]
pub struct OntologyService {
    evaluator: ConsistencyEvaluator,
    committer: InstantiationCommitter,
}

impl OntologyService {
    /// Creates a new [`OntologyService`] from a store handle.
    pub fn new(store: Arc<StoreHandle>, namespaces: Namespaces) -> Self {
        Self {
            evaluator: ConsistencyEvaluator::new(Arc::clone(&store), namespaces.clone()),
            committer: InstantiationCommitter::new(store, namespaces),
        }
    }

    /// Builds a service over the configured backend, loading every seed file
    /// into it first.
    ///
    /// # Errors
    ///
    /// Fails when a seed cannot be read, is not a valid ontology or cannot be
    /// loaded into the store.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<StoreHandle> = match config.store.backend {
            StoreBackend::InMemory => {
                let graph = InMemoryGraph::new();
                for path in &config.store.seeds {
                    let ontology =
                        OntologyDocument::from_path(path)?.into_ontology(&config.namespaces)?;
                    graph.load_ontology(&ontology)?;
                    info!(seed = %path.display(), ontology = %ontology.id(), "ontology_seeded");
                }
                Arc::new(graph)
            }
        };
        Ok(Self::new(store, config.namespaces.clone()))
    }

    /// Evaluates the candidate without writing anything.
    pub async fn evaluate(
        &self,
        candidate: &CandidateIndividual,
        context: &SubmissionContext,
    ) -> EvaluationReport {
        self.evaluator.evaluate(candidate, context).await
    }

    /// Evaluates the candidate and commits it when no error was found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] when a write fails during commit. Writes
    /// completed before the failure are not rolled back.
    pub async fn validate_and_commit(
        &self,
        candidate: &CandidateIndividual,
        context: &SubmissionContext,
    ) -> Result<Submission> {
        let report = self.evaluate(candidate, context).await;
        if !report.is_clean() {
            info!(
                individual = %candidate.name,
                errors = report.errors.len(),
                "individual_rejected"
            );
            return Ok(Submission::Rejected {
                warnings: report.warnings,
                errors: report.errors,
            });
        }

        let receipts = self
            .committer
            .commit(candidate)
            .await
            .map_err(Error::from_commit)?;
        Ok(Submission::Committed {
            warnings: report.warnings,
            receipts,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ontology::evaluation::{Level, Rule};

    fn warning() -> Evaluation {
        Evaluation::new(
            Level::Individual,
            "http://kb.local/owl/orgont#Pump1",
            Rule::PropertiesLack,
            json!(["http://kb.local/owl/orgont#hasLocation"]),
        )
    }

    #[test]
    fn committed_submissions_only_show_warnings() {
        let submission = Submission::Committed {
            warnings: vec![warning()],
            receipts: vec![],
        };
        let value = serde_json::to_value(&submission).expect("json");
        assert_eq!(value.as_object().map(|o| o.len()), Some(1));
        assert_eq!(value["warnings"][0]["evaluation"], "propertiesLack");
    }

    #[test]
    fn rejected_submissions_show_errors() {
        let submission = Submission::Rejected {
            warnings: vec![],
            errors: vec![warning()],
        };
        assert_eq!(
            serde_json::to_value(&submission).expect("json"),
            json!({ "warnings": [], "errors": [serde_json::to_value(warning()).expect("json")] })
        );
        assert!(!submission.is_committed());
    }

    #[tokio::test]
    async fn services_start_without_seeds() {
        let service = OntologyService::from_config(&Config::default()).expect("service");
        let report = service
            .evaluate(
                &CandidateIndividual::new(
                    "http://138.250.108.1:3003/api/files/owl/orgont#Pump1",
                    "http://138.250.108.1:3003/api/files/owl/orgont#",
                    "http://138.250.108.1:3003/api/files/owl/orgont#Pump",
                ),
                &SubmissionContext::new("orgont", "Pump1"),
            )
            .await;
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].evaluation, Rule::ClassExistence);
    }
}
