//! Consistency evaluation of candidate individuals.
//!
//! Every check runs concurrently with the others on the calling task and
//! resolves to exactly one [`Outcome`]. A check whose store access fails
//! becomes an [`Outcome::Error`] carrying the failure, so the remaining
//! checks still complete and the candidate is blocked.

use std::{
    fmt::{self, Display, Formatter},
    future::Future,
    sync::Arc,
};

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    candidate::{CandidateIndividual, PropertyAssignment, SubmissionContext},
    identifiers::Namespaces,
    repositories::{StoreError, StoreHandle},
    schema::{SchemaQueries, ValueResolution},
};

/// Whether a result concerns the individual itself or one of its properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Individual,
    Property,
}

/// Rule that produced an evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    ClassExistence,
    DomainCorrectness,
    RangeCorrectness,
    PropertyExistence,
    ValueExistence,
    SupportedType,
    OntologyCorrectness,
    NameCorrectness,
    PropertiesLack,
}

impl Rule {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClassExistence => "classExistence",
            Self::DomainCorrectness => "domainCorrectness",
            Self::RangeCorrectness => "rangeCorrectness",
            Self::PropertyExistence => "propertyExistence",
            Self::ValueExistence => "valueExistence",
            Self::SupportedType => "supportedType",
            Self::OntologyCorrectness => "ontologyCorrectness",
            Self::NameCorrectness => "nameCorrectness",
            Self::PropertiesLack => "propertiesLack",
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record shared by every outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub level: Level,
    pub name: String,
    pub evaluation: Rule,
    pub value: Value,
    /// Store failure that prevented the check from completing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl Evaluation {
    #[must_use]
    pub fn new(level: Level, name: impl Into<String>, evaluation: Rule, value: Value) -> Self {
        Self {
            level,
            name: name.into(),
            evaluation,
            value,
            failure: None,
        }
    }
}

/// Tagged result of one check.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Success(Evaluation),
    Error(Evaluation),
    Warning(Evaluation),
}

impl Outcome {
    #[must_use]
    pub fn evaluation(&self) -> &Evaluation {
        match self {
            Self::Success(evaluation) | Self::Error(evaluation) | Self::Warning(evaluation) => {
                evaluation
            }
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Error(_) => "error",
            Self::Warning(_) => "warning",
        }
    }
}

/// Outcomes split by tag, each list in evaluation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub successes: Vec<Evaluation>,
    pub errors: Vec<Evaluation>,
    pub warnings: Vec<Evaluation>,
}

impl EvaluationReport {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success(evaluation) => self.successes.push(evaluation),
            Outcome::Error(evaluation) => self.errors.push(evaluation),
            Outcome::Warning(evaluation) => self.warnings.push(evaluation),
        }
    }

    /// A candidate is clean when no error was recorded; warnings never block.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl FromIterator<Outcome> for EvaluationReport {
    fn from_iter<I: IntoIterator<Item = Outcome>>(iter: I) -> Self {
        let mut report = Self::default();
        for outcome in iter {
            report.record(outcome);
        }
        report
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Verdict {
    Pass,
    Fail,
    Advise,
}

impl From<bool> for Verdict {
    fn from(passed: bool) -> Self {
        if passed {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

impl From<ValueResolution> for Verdict {
    fn from(resolution: ValueResolution) -> Self {
        match resolution {
            ValueResolution::Resolved => Self::Pass,
            ValueResolution::UnresolvedTarget => Self::Advise,
            ValueResolution::MissingLiteral | ValueResolution::UnsupportedKind => Self::Fail,
        }
    }
}

/// What a check is about, known before it runs.
struct Subject {
    level: Level,
    name: String,
    rule: Rule,
    value: Value,
}

impl Subject {
    fn new(level: Level, name: &str, rule: Rule, value: impl Into<Value>) -> Self {
        Self {
            level,
            name: name.to_string(),
            rule,
            value: value.into(),
        }
    }

    fn conclude(self, verdict: Verdict) -> Outcome {
        let evaluation = Evaluation::new(self.level, self.name, self.rule, self.value);
        let outcome = match verdict {
            Verdict::Pass => Outcome::Success(evaluation),
            Verdict::Fail => Outcome::Error(evaluation),
            Verdict::Advise => Outcome::Warning(evaluation),
        };
        debug!(
            rule = %outcome.evaluation().evaluation,
            subject = %outcome.evaluation().name,
            outcome = outcome.tag(),
            "evaluation_check"
        );
        outcome
    }

    fn fail_with(self, error: &StoreError) -> Outcome {
        warn!(
            rule = %self.rule,
            subject = %self.name,
            err.msg = %error,
            err.detail = ?error,
            "evaluation_check_store_failure"
        );
        let mut evaluation = Evaluation::new(self.level, self.name, self.rule, self.value);
        evaluation.failure = Some(error.to_string());
        Outcome::Error(evaluation)
    }
}

/// Awaits one check and settles it into an outcome, turning a store failure
/// into an error for that check only.
async fn settle<F, V>(subject: Subject, check: F) -> Outcome
where
    F: Future<Output = Result<V, StoreError>>,
    V: Into<Verdict>,
{
    match check.await {
        Ok(verdict) => subject.conclude(verdict.into()),
        Err(error) => subject.fail_with(&error),
    }
}

fn optional_value(value: Option<&str>) -> Value {
    value.map_or(Value::Null, Value::from)
}

/// Runs every schema check for one candidate.
#[derive(Clone)]
pub struct ConsistencyEvaluator {
    schema: SchemaQueries,
    namespaces: Namespaces,
}

impl ConsistencyEvaluator {
    pub fn new(store: Arc<StoreHandle>, namespaces: Namespaces) -> Self {
        Self {
            schema: SchemaQueries::new(store),
            namespaces,
        }
    }

    /// Evaluates the candidate against the stored schema.
    ///
    /// The returned lists follow a fixed order regardless of completion
    /// order: class existence, the four checks of each property in
    /// submission order, ontology correctness, name correctness and finally
    /// missing properties.
    pub async fn evaluate(
        &self,
        candidate: &CandidateIndividual,
        context: &SubmissionContext,
    ) -> EvaluationReport {
        let (class_outcome, property_outcomes, lack_outcome) = futures_util::join!(
            self.class_existence(candidate),
            join_all(
                candidate
                    .properties
                    .iter()
                    .map(|assignment| self.property_consistency(assignment)),
            ),
            self.properties_lack(candidate),
        );

        let mut outcomes = vec![class_outcome];
        outcomes.extend(property_outcomes.into_iter().flatten());
        outcomes.push(self.ontology_correctness(candidate, context));
        outcomes.push(self.name_correctness(candidate, context));
        outcomes.push(lack_outcome);

        let report: EvaluationReport = outcomes.into_iter().collect();
        info!(
            individual = %candidate.name,
            successes = report.successes.len(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            clean = report.is_clean(),
            "individual_evaluated"
        );
        report
    }

    async fn class_existence(&self, candidate: &CandidateIndividual) -> Outcome {
        let subject = Subject::new(
            Level::Individual,
            &candidate.name,
            Rule::ClassExistence,
            candidate.class.as_str(),
        );
        settle(subject, self.schema.class_exists(&candidate.class)).await
    }

    async fn property_consistency(&self, assignment: &PropertyAssignment) -> [Outcome; 4] {
        let name = assignment.name.as_str();
        let value_rule = if assignment.property_kind().is_some() {
            Rule::ValueExistence
        } else {
            Rule::SupportedType
        };

        let (domain, range, existence, value) = futures_util::join!(
            settle(
                Subject::new(
                    Level::Property,
                    name,
                    Rule::DomainCorrectness,
                    assignment.domain.as_str(),
                ),
                self.schema.property_domain_matches(name, &assignment.domain),
            ),
            settle(
                Subject::new(
                    Level::Property,
                    name,
                    Rule::RangeCorrectness,
                    assignment.range.as_str(),
                ),
                self.schema.property_range_matches(name, &assignment.range),
            ),
            settle(
                Subject::new(Level::Property, name, Rule::PropertyExistence, name),
                self.schema.property_declared(name),
            ),
            settle(
                Subject::new(
                    Level::Property,
                    name,
                    value_rule,
                    optional_value(assignment.value.as_deref()),
                ),
                self.schema.value_resolution(assignment),
            ),
        );
        [domain, range, existence, value]
    }

    fn ontology_correctness(
        &self,
        candidate: &CandidateIndividual,
        context: &SubmissionContext,
    ) -> Outcome {
        let expected = self.namespaces.ontology_uri(&context.ontology_name);
        Subject::new(
            Level::Individual,
            &candidate.name,
            Rule::OntologyCorrectness,
            candidate.ontology.as_str(),
        )
        .conclude(Verdict::from(candidate.ontology == expected))
    }

    fn name_correctness(
        &self,
        candidate: &CandidateIndividual,
        context: &SubmissionContext,
    ) -> Outcome {
        let expected = self
            .namespaces
            .build_uri(&context.ontology_name, &context.individual_name);
        Subject::new(
            Level::Individual,
            &candidate.name,
            Rule::NameCorrectness,
            candidate.name.as_str(),
        )
        .conclude(Verdict::from(candidate.name == expected))
    }

    /// Reports the domain properties the candidate leaves unassigned as a
    /// single warning, emitted with an empty list when none is missing.
    async fn properties_lack(&self, candidate: &CandidateIndividual) -> Outcome {
        let subject = |value: Value| {
            Subject::new(Level::Individual, &candidate.name, Rule::PropertiesLack, value)
        };
        match self.schema.properties_of_domain(&candidate.class).await {
            Ok(declared) => {
                let assigned: Vec<&str> = candidate.property_names().collect();
                let missing: Vec<String> = declared
                    .into_iter()
                    .filter(|property| !assigned.contains(&property.as_str()))
                    .collect();
                subject(Value::from(missing)).conclude(Verdict::Advise)
            }
            Err(error) => subject(Value::Null).fail_with(&error),
        }
    }
}
