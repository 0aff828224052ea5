use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Node labels, relation types and attribute keys of the neosemantics layout.
pub mod vocabulary {
    pub const RESOURCE: &str = "Resource";
    pub const OWL_CLASS: &str = "owl__Class";
    pub const OWL_OBJECT_PROPERTY: &str = "owl__ObjectProperty";
    pub const OWL_DATATYPE_PROPERTY: &str = "owl__DatatypeProperty";
    pub const OWL_NAMED_INDIVIDUAL: &str = "owl__NamedIndividual";
    pub const RDFS_DOMAIN: &str = "rdfs__domain";
    pub const RDFS_RANGE: &str = "rdfs__range";
    pub const RDFS_SUB_CLASS_OF: &str = "rdfs__subClassOf";
    pub const RDFS_LABEL: &str = "rdfs__label";
    pub const RDFS_COMMENT: &str = "rdfs__comment";
}

/// Named parameters bound to a [`GraphQuery`].
pub type Params = BTreeMap<String, String>;

/// One row of a [`ResultSet`], keyed by pattern variable.
pub type Row = BTreeMap<String, String>;

/// Node constraint inside a graph pattern.
///
/// The URI is never inlined: it names a parameter that the store resolves
/// from [`GraphQuery::params`]. An empty label list matches any node,
/// otherwise the node must carry at least one of the labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePattern {
    pub variable: String,
    pub uri_param: Option<String>,
    pub labels: Vec<String>,
}

impl NodePattern {
    #[must_use]
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            uri_param: None,
            labels: Vec::new(),
        }
    }

    /// Constrains the node URI to the value of the named parameter.
    #[must_use]
    pub fn with_uri(mut self, param: impl Into<String>) -> Self {
        self.uri_param = Some(param.into());
        self
    }

    /// Requires the node to carry at least one of the labels.
    #[must_use]
    pub fn with_any_label<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }
}

/// Declarative pattern matched by [`GraphStore::query`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// `(n)`
    Node(NodePattern),
    /// `(source)-[:relation]->(target)`
    Relation {
        source: NodePattern,
        relation: String,
        target: NodePattern,
    },
}

/// Parameterized read-only query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphQuery {
    pattern: Pattern,
    params: Params,
}

impl GraphQuery {
    #[must_use]
    pub fn node(node: NodePattern) -> Self {
        Self {
            pattern: Pattern::Node(node),
            params: Params::new(),
        }
    }

    #[must_use]
    pub fn relation(source: NodePattern, relation: impl Into<String>, target: NodePattern) -> Self {
        Self {
            pattern: Pattern::Relation {
                source,
                relation: relation.into(),
                target,
            },
            params: Params::new(),
        }
    }

    /// Binds a named parameter.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Resolves a parameter referenced by the pattern.
    pub fn param(&self, name: &str) -> Result<&str, StoreError> {
        self.params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| StoreError::UnboundParameter(name.to_string()))
    }
}

/// Tabular answer to a [`GraphQuery`]: one row per match, one column per
/// pattern variable holding the matched node URI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
}

impl ResultSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns the values bound to `variable`, in row order.
    pub fn column<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.get(variable).map(String::as_str))
    }
}

/// Write operations supported by the store. All are idempotent except
/// [`GraphWrite::SetAttribute`], which overwrites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphWrite {
    /// Upserts the node keyed by `uri` and adds any missing labels.
    MergeNode { uri: String, labels: Vec<String> },
    /// Upserts the `target` node with `target_labels` and the typed edge
    /// from the existing `source` node to it.
    MergeRelation {
        source: String,
        relation: String,
        target: String,
        target_labels: Vec<String>,
    },
    /// Sets a scalar attribute on the existing node, last write wins.
    SetAttribute {
        uri: String,
        key: String,
        value: String,
    },
}

impl GraphWrite {
    #[must_use]
    pub fn operation(&self) -> WriteOperation {
        match self {
            Self::MergeNode { .. } => WriteOperation::MergeNode,
            Self::MergeRelation { .. } => WriteOperation::MergeRelation,
            Self::SetAttribute { .. } => WriteOperation::SetAttribute,
        }
    }

    /// URI of the node the write is anchored on.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::MergeNode { uri, .. } | Self::SetAttribute { uri, .. } => uri,
            Self::MergeRelation { source, .. } => source,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    MergeNode,
    MergeRelation,
    SetAttribute,
}

/// Store confirmation for one write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WriteReceipt {
    pub operation: WriteOperation,
    pub subject: String,
    pub nodes_created: usize,
    pub labels_added: usize,
    pub relationships_created: usize,
    pub properties_set: usize,
}

impl WriteReceipt {
    #[must_use]
    pub fn new(operation: WriteOperation, subject: impl Into<String>) -> Self {
        Self {
            operation,
            subject: subject.into(),
            nodes_created: 0,
            labels_added: 0,
            relationships_created: 0,
            properties_set: 0,
        }
    }

    /// Whether the write changed anything in the store.
    #[must_use]
    pub fn contains_updates(&self) -> bool {
        self.nodes_created + self.labels_added + self.relationships_created + self.properties_set
            > 0
    }
}

/// Failures raised by store adapters.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("graph store unavailable: {0}")]
    Unavailable(String),
    /// A pattern referenced a parameter that was never bound.
    #[error("query parameter `{0}` is not bound")]
    UnboundParameter(String),
    /// A write was anchored on a node that does not exist.
    #[error("node `{uri}` does not exist")]
    NodeNotFound { uri: String },
}

/// Contract of the graph store holding the schema and the individuals.
#[async_trait]
pub trait GraphStore {
    /// Associated error type allowing infrastructure specific failures.
    type Error;

    /// Matches a parameterized pattern; read-only.
    async fn query(&self, query: &GraphQuery) -> Result<ResultSet, Self::Error>;

    /// Applies one write operation atomically.
    async fn write(&self, write: &GraphWrite) -> Result<WriteReceipt, Self::Error>;
}

/// Type alias simplifying store trait object usage across the engine.
pub type StoreHandle = dyn GraphStore<Error = StoreError> + Send + Sync + 'static;

#[cfg(test)]
mod tests {
    use super::{
        vocabulary, GraphQuery, GraphWrite, NodePattern, ResultSet, Row, StoreError, WriteOperation,
    };

    #[test]
    fn unbound_parameters_are_reported() {
        let query = GraphQuery::node(NodePattern::new("n").with_uri("uri"));
        assert_eq!(
            query.param("uri"),
            Err(StoreError::UnboundParameter("uri".to_string()))
        );
        let query = query.bind("uri", "http://kb.local/owl/orgont#Pump");
        assert_eq!(query.param("uri"), Ok("http://kb.local/owl/orgont#Pump"));
    }

    #[test]
    fn node_patterns_accumulate_labels() {
        let pattern = NodePattern::new("p")
            .with_any_label([vocabulary::OWL_OBJECT_PROPERTY])
            .with_any_label([vocabulary::OWL_DATATYPE_PROPERTY]);
        assert_eq!(
            pattern.labels,
            vec!["owl__ObjectProperty".to_string(), "owl__DatatypeProperty".to_string()]
        );
    }

    #[test]
    fn result_columns_skip_unbound_rows() {
        let mut first = Row::new();
        first.insert("p".into(), "a".into());
        let mut second = Row::new();
        second.insert("c".into(), "b".into());
        let results = ResultSet {
            rows: vec![first, second],
        };
        assert_eq!(results.column("p").collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn writes_expose_their_subject() {
        let write = GraphWrite::MergeRelation {
            source: "s".into(),
            relation: "orgont__hasLocation".into(),
            target: "t".into(),
            target_labels: vec![],
        };
        assert_eq!(write.subject(), "s");
        assert_eq!(write.operation(), WriteOperation::MergeRelation);
    }
}
