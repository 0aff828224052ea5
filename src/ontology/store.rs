use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{
    entities::{Ontology, PropertyAssertion, PropertyKind},
    identifiers::{self, Namespaces},
    repositories::{
        vocabulary, GraphQuery, GraphStore, GraphWrite, NodePattern, Pattern, ResultSet, Row,
        StoreError, WriteReceipt,
    },
    value_objects::Iri,
};

/// A node of the in-memory graph: URI key, labels and scalar attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub uri: String,
    pub labels: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
}

impl NodeRecord {
    fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Attributes belonging to the ontology `prefix`, keyed by local name.
    #[must_use]
    pub fn attributes_in(&self, prefix: &str) -> BTreeMap<&str, &str> {
        self.attributes
            .iter()
            .filter_map(|(key, value)| {
                identifiers::local_name(prefix, key).map(|name| (name, value.as_str()))
            })
            .collect()
    }

    /// Global identifiers of the classes the node is labelled with.
    #[must_use]
    pub fn class_uris(&self, namespaces: &Namespaces) -> Vec<String> {
        self.labels
            .iter()
            .filter(|label| label.as_str() != vocabulary::OWL_NAMED_INDIVIDUAL)
            .filter_map(|label| namespaces.to_uri(label))
            .collect()
    }

    fn matches(&self, labels: &[String]) -> bool {
        labels.is_empty() || labels.iter().any(|label| self.labels.contains(label))
    }

    fn add_labels(&mut self, labels: &[String]) -> usize {
        labels
            .iter()
            .filter(|label| self.labels.insert((*label).clone()))
            .count()
    }
}

#[derive(Default)]
struct GraphState {
    nodes: BTreeMap<String, NodeRecord>,
    relations: BTreeSet<(String, String, String)>,
}

impl GraphState {
    fn merge_node(&mut self, uri: &str, labels: &[String], receipt: &mut WriteReceipt) {
        let node = self.nodes.entry(uri.to_string()).or_insert_with(|| {
            receipt.nodes_created += 1;
            NodeRecord::new(uri)
        });
        receipt.labels_added += node.add_labels(labels);
    }

    fn apply(&mut self, write: &GraphWrite) -> Result<WriteReceipt, StoreError> {
        let mut receipt = WriteReceipt::new(write.operation(), write.subject());
        match write {
            GraphWrite::MergeNode { uri, labels } => self.merge_node(uri, labels, &mut receipt),
            GraphWrite::MergeRelation {
                source,
                relation,
                target,
                target_labels,
            } => {
                self.require(source)?;
                self.merge_node(target, target_labels, &mut receipt);
                if self
                    .relations
                    .insert((source.clone(), relation.clone(), target.clone()))
                {
                    receipt.relationships_created += 1;
                }
            }
            GraphWrite::SetAttribute { uri, key, value } => {
                let node = self
                    .nodes
                    .get_mut(uri)
                    .ok_or_else(|| StoreError::NodeNotFound { uri: uri.clone() })?;
                node.attributes.insert(key.clone(), value.clone());
                receipt.properties_set += 1;
            }
        }
        Ok(receipt)
    }

    fn require(&self, uri: &str) -> Result<&NodeRecord, StoreError> {
        self.nodes.get(uri).ok_or_else(|| StoreError::NodeNotFound {
            uri: uri.to_string(),
        })
    }

    fn candidates<'a>(
        &'a self,
        pattern: &NodePattern,
        query: &GraphQuery,
    ) -> Result<Vec<&'a NodeRecord>, StoreError> {
        let nodes: Vec<&NodeRecord> = match &pattern.uri_param {
            Some(param) => self.nodes.get(query.param(param)?).into_iter().collect(),
            None => self.nodes.values().collect(),
        };
        Ok(nodes
            .into_iter()
            .filter(|node| node.matches(&pattern.labels))
            .collect())
    }

    fn node_matches(
        &self,
        uri: &str,
        pattern: &NodePattern,
        query: &GraphQuery,
    ) -> Result<bool, StoreError> {
        if let Some(param) = &pattern.uri_param {
            if query.param(param)? != uri {
                return Ok(false);
            }
        }
        Ok(self
            .nodes
            .get(uri)
            .is_some_and(|node| node.matches(&pattern.labels)))
    }

    fn evaluate(&self, query: &GraphQuery) -> Result<ResultSet, StoreError> {
        let mut rows = Vec::new();
        match query.pattern() {
            Pattern::Node(pattern) => {
                for node in self.candidates(pattern, query)? {
                    rows.push(Row::from([(pattern.variable.clone(), node.uri.clone())]));
                }
            }
            Pattern::Relation {
                source,
                relation,
                target,
            } => {
                for (from, kind, to) in &self.relations {
                    if kind != relation
                        || !self.node_matches(from, source, query)?
                        || !self.node_matches(to, target, query)?
                    {
                        continue;
                    }
                    rows.push(Row::from([
                        (source.variable.clone(), from.clone()),
                        (target.variable.clone(), to.clone()),
                    ]));
                }
            }
        }
        Ok(ResultSet { rows })
    }
}

/// Graph store kept in process memory.
///
/// Nodes are keyed by URI, so every node write is an upsert. Each operation
/// holds the lock for its whole duration; no lock spans two operations.
#[derive(Default)]
pub struct InMemoryGraph {
    state: Mutex<GraphState>,
}

impl InMemoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, GraphState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory graph lock poisoned".to_string()))
    }

    /// Returns a copy of the node stored under `uri`.
    #[must_use]
    pub fn node(&self, uri: &str) -> Option<NodeRecord> {
        self.guard().ok()?.nodes.get(uri).cloned()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.guard().map(|state| state.nodes.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.guard()
            .map(|state| state.relations.len())
            .unwrap_or_default()
    }

    /// Outgoing edges of `uri` as `(relation, target)` pairs.
    #[must_use]
    pub fn relations_from(&self, uri: &str) -> Vec<(String, String)> {
        self.guard()
            .map(|state| {
                state
                    .relations
                    .iter()
                    .filter(|(source, _, _)| source == uri)
                    .map(|(_, relation, target)| (relation.clone(), target.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Loads an ontology schema and its individuals using the neosemantics
    /// layout: classes and properties become `Resource` nodes labelled with
    /// their OWL type, domains/ranges/parents become `rdfs__*` edges.
    pub fn load_ontology(&self, ontology: &Ontology) -> Result<(), StoreError> {
        let writes = schema_writes(ontology);
        let mut state = self.guard()?;
        for write in &writes {
            state.apply(write)?;
        }
        debug!(
            ontology = %ontology.id(),
            writes = writes.len(),
            nodes = state.nodes.len(),
            "ontology_loaded"
        );
        Ok(())
    }
}

#[async_trait]
impl GraphStore for InMemoryGraph {
    type Error = StoreError;

    async fn query(&self, query: &GraphQuery) -> Result<ResultSet, Self::Error> {
        self.guard()?.evaluate(query)
    }

    async fn write(&self, write: &GraphWrite) -> Result<WriteReceipt, Self::Error> {
        self.guard()?.apply(write)
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

fn schema_writes(ontology: &Ontology) -> Vec<GraphWrite> {
    let mut writes = Vec::new();
    let resource = |uri: &Iri| GraphWrite::MergeNode {
        uri: uri.to_string(),
        labels: labels(&[vocabulary::RESOURCE]),
    };

    for class in ontology.classes().values() {
        writes.push(GraphWrite::MergeNode {
            uri: class.id().to_string(),
            labels: labels(&[vocabulary::RESOURCE, vocabulary::OWL_CLASS]),
        });
        for (key, text) in [
            (vocabulary::RDFS_LABEL, class.label()),
            (vocabulary::RDFS_COMMENT, class.comment()),
        ] {
            if let Some(text) = text {
                writes.push(GraphWrite::SetAttribute {
                    uri: class.id().to_string(),
                    key: key.to_string(),
                    value: text.to_string(),
                });
            }
        }
    }
    for class in ontology.classes().values() {
        for parent in class.parents() {
            writes.push(resource(parent));
            writes.push(GraphWrite::MergeRelation {
                source: class.id().to_string(),
                relation: vocabulary::RDFS_SUB_CLASS_OF.to_string(),
                target: parent.to_string(),
                target_labels: Vec::new(),
            });
        }
    }

    for property in ontology.properties().values() {
        let kind_label = match property.kind() {
            PropertyKind::Object => vocabulary::OWL_OBJECT_PROPERTY,
            PropertyKind::Datatype => vocabulary::OWL_DATATYPE_PROPERTY,
        };
        writes.push(GraphWrite::MergeNode {
            uri: property.id().to_string(),
            labels: labels(&[vocabulary::RESOURCE, kind_label]),
        });
        let edges = property
            .domains()
            .iter()
            .map(|domain| (vocabulary::RDFS_DOMAIN, domain))
            .chain(property.ranges().iter().map(|range| (vocabulary::RDFS_RANGE, range)));
        for (relation, target) in edges {
            writes.push(GraphWrite::MergeRelation {
                source: property.id().to_string(),
                relation: relation.to_string(),
                target: target.to_string(),
                target_labels: labels(&[vocabulary::RESOURCE]),
            });
        }
    }

    for individual in ontology.individuals().values() {
        let mut node_labels = labels(&[vocabulary::RESOURCE, vocabulary::OWL_NAMED_INDIVIDUAL]);
        node_labels.extend(individual.types().iter().filter_map(Iri::compact));
        writes.push(GraphWrite::MergeNode {
            uri: individual.id().to_string(),
            labels: node_labels,
        });
    }
    for individual in ontology.individuals().values() {
        for (property, assertions) in individual.properties() {
            let Some(key) = property.compact() else {
                continue;
            };
            for assertion in assertions {
                writes.push(match assertion {
                    PropertyAssertion::Individual(target) => GraphWrite::MergeRelation {
                        source: individual.id().to_string(),
                        relation: key.clone(),
                        target: target.to_string(),
                        target_labels: labels(&[vocabulary::RESOURCE]),
                    },
                    PropertyAssertion::Literal(value) => GraphWrite::SetAttribute {
                        uri: individual.id().to_string(),
                        key: key.clone(),
                        value: value.clone(),
                    },
                });
            }
        }
    }

    writes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::entities::{Class, Individual, Property};

    const BASE: &str = "http://kb.local/owl/";

    fn iri(name: &str) -> Iri {
        Iri::new(format!("{BASE}orgont#{name}")).expect("valid iri")
    }

    fn ontology() -> Ontology {
        let mut ontology = Ontology::new(iri(""));
        let mut pump = Class::new(iri("Pump")).with_label("Pump");
        pump.add_parent(iri("Asset"));
        ontology.add_class(Class::new(iri("Asset"))).expect("asset");
        ontology.add_class(pump).expect("pump");
        ontology.add_class(Class::new(iri("Location"))).expect("location");

        let mut status = Property::new(iri("hasStatus"), PropertyKind::Datatype);
        status.add_domain(iri("Pump"));
        status.add_range(Iri::new("http://www.w3.org/2001/XMLSchema#string").expect("xsd"));
        ontology.add_property(status).expect("status");

        let mut location = Property::new(iri("hasLocation"), PropertyKind::Object);
        location.add_domain(iri("Pump"));
        location.add_range(iri("Location"));
        ontology.add_property(location).expect("location");

        let mut hall = Individual::new(iri("Hall"));
        hall.assert_type(iri("Location"));
        ontology.add_individual(hall).expect("hall");
        ontology
    }

    fn seeded() -> InMemoryGraph {
        let graph = InMemoryGraph::new();
        graph.load_ontology(&ontology()).expect("ontology loaded");
        graph
    }

    #[test]
    fn schema_is_loaded_with_owl_labels() {
        let graph = seeded();
        let pump = graph.node(iri("Pump").as_str()).expect("pump node");
        assert!(pump.has_label(vocabulary::OWL_CLASS));
        assert_eq!(pump.attributes.get(vocabulary::RDFS_LABEL).map(String::as_str), Some("Pump"));

        let status = graph.node(iri("hasStatus").as_str()).expect("status node");
        assert!(status.has_label(vocabulary::OWL_DATATYPE_PROPERTY));

        let hall = graph.node(iri("Hall").as_str()).expect("hall node");
        assert!(hall.has_label("orgont__Location"));
        assert_eq!(
            hall.class_uris(&Namespaces::with_base_url(BASE)),
            vec![iri("Location").to_string()]
        );

        assert!(graph
            .relations_from(iri("Pump").as_str())
            .contains(&(vocabulary::RDFS_SUB_CLASS_OF.to_string(), iri("Asset").to_string())));
    }

    #[tokio::test]
    async fn relation_queries_bind_parameters() {
        let graph = seeded();
        let query = GraphQuery::relation(
            NodePattern::new("p").with_any_label([
                vocabulary::OWL_OBJECT_PROPERTY,
                vocabulary::OWL_DATATYPE_PROPERTY,
            ]),
            vocabulary::RDFS_DOMAIN,
            NodePattern::new("c")
                .with_uri("class")
                .with_any_label([vocabulary::OWL_CLASS]),
        )
        .bind("class", iri("Pump").as_str());

        let results = graph.query(&query).await.expect("query");
        let mut properties: Vec<&str> = results.column("p").collect();
        properties.sort_unstable();
        assert_eq!(
            properties,
            vec![iri("hasLocation").as_str(), iri("hasStatus").as_str()]
        );
    }

    #[tokio::test]
    async fn unbound_parameter_fails_the_query() {
        let graph = seeded();
        let query = GraphQuery::node(NodePattern::new("n").with_uri("uri"));
        let err = graph.query(&query).await.expect_err("unbound");
        assert_eq!(err, StoreError::UnboundParameter("uri".into()));
    }

    #[tokio::test]
    async fn merges_are_idempotent() {
        let graph = seeded();
        let nodes = graph.node_count();
        let write = GraphWrite::MergeNode {
            uri: iri("Pump1").to_string(),
            labels: labels(&[vocabulary::RESOURCE, "orgont__Pump"]),
        };

        let first = graph.write(&write).await.expect("first merge");
        assert_eq!(first.nodes_created, 1);
        assert_eq!(first.labels_added, 2);

        let second = graph.write(&write).await.expect("second merge");
        assert!(!second.contains_updates());
        assert_eq!(graph.node_count(), nodes + 1);

        let edge = GraphWrite::MergeRelation {
            source: iri("Pump1").to_string(),
            relation: "orgont__hasLocation".into(),
            target: iri("Hall").to_string(),
            target_labels: labels(&[vocabulary::RESOURCE]),
        };
        assert_eq!(graph.write(&edge).await.expect("edge").relationships_created, 1);
        assert_eq!(graph.write(&edge).await.expect("edge again").relationships_created, 0);
    }

    #[tokio::test]
    async fn attributes_are_overwritten() {
        let graph = seeded();
        let uri = iri("Hall").to_string();
        for value in ["open", "closed"] {
            graph
                .write(&GraphWrite::SetAttribute {
                    uri: uri.clone(),
                    key: "orgont__hasStatus".into(),
                    value: value.into(),
                })
                .await
                .expect("attribute set");
        }
        let hall = graph.node(&uri).expect("hall");
        assert_eq!(hall.attributes_in("orgont").get("hasStatus"), Some(&"closed"));
        assert!(hall.attributes_in("diagont").is_empty());
    }

    #[tokio::test]
    async fn writes_on_missing_nodes_fail() {
        let graph = InMemoryGraph::new();
        let err = graph
            .write(&GraphWrite::SetAttribute {
                uri: "http://kb.local/owl/orgont#Ghost".into(),
                key: "orgont__hasStatus".into(),
                value: "x".into(),
            })
            .await
            .expect_err("missing node");
        assert!(matches!(err, StoreError::NodeNotFound { .. }));
        assert_eq!(graph.node_count(), 0);
    }
}
