//! Read-only schema lookups, each one parameterized graph query.

use std::{collections::BTreeSet, sync::Arc};

use super::{
    candidate::PropertyAssignment,
    entities::PropertyKind,
    repositories::{vocabulary, GraphQuery, NodePattern, StoreError, StoreHandle},
};

/// Outcome of resolving an assignment's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueResolution {
    /// Object target exists, or the literal is present.
    Resolved,
    /// Object target is not in the store (or no target was given).
    UnresolvedTarget,
    /// Datatype assignment without a literal.
    MissingLiteral,
    /// The declared property type is neither object nor datatype.
    UnsupportedKind,
}

/// Schema lookups against an injected store handle.
#[derive(Clone)]
pub struct SchemaQueries {
    store: Arc<StoreHandle>,
}

impl SchemaQueries {
    pub fn new(store: Arc<StoreHandle>) -> Self {
        Self { store }
    }

    async fn exists(&self, query: GraphQuery) -> Result<bool, StoreError> {
        Ok(!self.store.query(&query).await?.is_empty())
    }

    async fn node_exists(&self, uri: &str) -> Result<bool, StoreError> {
        self.exists(GraphQuery::node(NodePattern::new("n").with_uri("uri")).bind("uri", uri))
            .await
    }

    async fn edge_exists(
        &self,
        source: &str,
        relation: &str,
        target: &str,
    ) -> Result<bool, StoreError> {
        let query = GraphQuery::relation(
            NodePattern::new("a").with_uri("source"),
            relation,
            NodePattern::new("b").with_uri("target"),
        )
        .bind("source", source)
        .bind("target", target);
        self.exists(query).await
    }

    /// Whether an `owl__Class` node with the URI exists.
    ///
    /// A node with the URI but without the class label does not count.
    pub async fn class_exists(&self, class: &str) -> Result<bool, StoreError> {
        let query = GraphQuery::node(
            NodePattern::new("c")
                .with_uri("class")
                .with_any_label([vocabulary::OWL_CLASS]),
        )
        .bind("class", class);
        self.exists(query).await
    }

    /// Object and datatype properties whose domain is `class`, ordered by URI.
    pub async fn properties_of_domain(&self, class: &str) -> Result<BTreeSet<String>, StoreError> {
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
        .bind("class", class);
        let results = self.store.query(&query).await?;
        Ok(results.column("p").map(ToString::to_string).collect())
    }

    /// Whether a domain edge links the property to exactly the claimed class.
    pub async fn property_domain_matches(
        &self,
        property: &str,
        domain: &str,
    ) -> Result<bool, StoreError> {
        self.edge_exists(property, vocabulary::RDFS_DOMAIN, domain).await
    }

    /// Whether a range edge links the property to exactly the claimed range.
    pub async fn property_range_matches(
        &self,
        property: &str,
        range: &str,
    ) -> Result<bool, StoreError> {
        self.edge_exists(property, vocabulary::RDFS_RANGE, range).await
    }

    /// Whether any node carries the property URI.
    pub async fn property_declared(&self, property: &str) -> Result<bool, StoreError> {
        self.node_exists(property).await
    }

    /// Resolves the assignment value according to its declared kind.
    ///
    /// Only object values hit the store; datatype values are checked for
    /// presence and unsupported kinds are classified without a query.
    pub async fn value_resolution(
        &self,
        assignment: &PropertyAssignment,
    ) -> Result<ValueResolution, StoreError> {
        match (assignment.property_kind(), assignment.value.as_deref()) {
            (None, _) => Ok(ValueResolution::UnsupportedKind),
            (Some(PropertyKind::Datatype), Some(_)) => Ok(ValueResolution::Resolved),
            (Some(PropertyKind::Datatype), None) => Ok(ValueResolution::MissingLiteral),
            (Some(PropertyKind::Object), None) => Ok(ValueResolution::UnresolvedTarget),
            (Some(PropertyKind::Object), Some(target)) => Ok(if self.node_exists(target).await? {
                ValueResolution::Resolved
            } else {
                ValueResolution::UnresolvedTarget
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::ontology::{
        entities::{Class, Individual, Ontology, Property},
        store::InMemoryGraph,
        value_objects::Iri,
    };

    const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    fn uri(name: &str) -> String {
        format!("http://kb.local/owl/orgont#{name}")
    }

    fn iri(name: &str) -> Iri {
        Iri::new(uri(name)).expect("valid iri")
    }

    fn queries() -> SchemaQueries {
        let mut ontology = Ontology::new(iri(""));
        ontology.add_class(Class::new(iri("Pump"))).expect("pump");
        ontology.add_class(Class::new(iri("Valve"))).expect("valve");
        ontology.add_class(Class::new(iri("Location"))).expect("location");

        let mut status = Property::new(iri("hasStatus"), PropertyKind::Datatype);
        status.add_domain(iri("Pump"));
        status.add_range(Iri::new(XSD_STRING).expect("xsd"));
        ontology.add_property(status).expect("status");

        let mut location = Property::new(iri("hasLocation"), PropertyKind::Object);
        location.add_domain(iri("Pump"));
        location.add_range(iri("Location"));
        ontology.add_property(location).expect("location");

        let mut hall = Individual::new(iri("Hall"));
        hall.assert_type(iri("Location"));
        ontology.add_individual(hall).expect("hall");

        let graph = InMemoryGraph::new();
        graph.load_ontology(&ontology).expect("loaded");
        SchemaQueries::new(Arc::new(graph))
    }

    #[tokio::test]
    async fn classes_must_be_owl_classes() {
        let schema = queries();
        assert!(schema.class_exists(&uri("Pump")).await.expect("query"));
        assert!(!schema.class_exists(&uri("hasStatus")).await.expect("query"));
        assert!(!schema.class_exists(&uri("Compressor")).await.expect("query"));
    }

    #[tokio::test]
    async fn domain_properties_are_collected() {
        let schema = queries();
        let properties = schema.properties_of_domain(&uri("Pump")).await.expect("query");
        assert_eq!(
            properties.into_iter().collect::<Vec<_>>(),
            vec![uri("hasLocation"), uri("hasStatus")]
        );
        assert!(schema
            .properties_of_domain(&uri("Valve"))
            .await
            .expect("query")
            .is_empty());
    }

    #[tokio::test]
    async fn domain_and_range_must_match_exactly() {
        let schema = queries();
        assert!(schema
            .property_domain_matches(&uri("hasStatus"), &uri("Pump"))
            .await
            .expect("query"));
        assert!(!schema
            .property_domain_matches(&uri("hasStatus"), &uri("Valve"))
            .await
            .expect("query"));
        assert!(schema
            .property_range_matches(&uri("hasStatus"), XSD_STRING)
            .await
            .expect("query"));
        assert!(!schema
            .property_range_matches(&uri("hasLocation"), XSD_STRING)
            .await
            .expect("query"));
        assert!(schema.property_declared(&uri("hasLocation")).await.expect("query"));
        assert!(!schema.property_declared(&uri("hasColour")).await.expect("query"));
    }

    fn location(target: Option<&str>) -> PropertyAssignment {
        PropertyAssignment::new(
            uri("hasLocation"),
            target.map(uri),
            uri("Pump"),
            uri("Location"),
            "ObjectProperty",
        )
    }

    fn status(value: Option<&str>, kind: &str) -> PropertyAssignment {
        PropertyAssignment::new(
            uri("hasStatus"),
            value.map(ToString::to_string),
            uri("Pump"),
            XSD_STRING,
            kind,
        )
    }

    #[rstest]
    #[case(location(Some("Hall")), ValueResolution::Resolved)]
    #[case(location(Some("Yard")), ValueResolution::UnresolvedTarget)]
    #[case(location(None), ValueResolution::UnresolvedTarget)]
    #[case(status(Some("Running"), "DatatypeProperty"), ValueResolution::Resolved)]
    #[case(status(None, "DatatypeProperty"), ValueResolution::MissingLiteral)]
    #[case(status(Some("x"), "AnnotationProperty"), ValueResolution::UnsupportedKind)]
    #[tokio::test]
    async fn values_resolve_by_kind(
        #[case] assignment: PropertyAssignment,
        #[case] expected: ValueResolution,
    ) {
        let schema = queries();
        assert_eq!(
            schema.value_resolution(&assignment).await.expect("query"),
            expected
        );
    }
}
