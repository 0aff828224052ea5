use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value_objects::Iri;

/// Ontology class definition capturing parent relationships and metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Class {
    id: Iri,
    label: Option<String>,
    comment: Option<String>,
    super_classes: BTreeSet<Iri>,
}

impl Class {
    /// Creates a new [`Class`] with the supplied identifier.
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            label: None,
            comment: None,
            super_classes: BTreeSet::new(),
        }
    }

    /// Sets a human friendly label for the class.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets a textual description for the class.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Adds a new parent class relation.
    pub fn add_parent(&mut self, parent: Iri) -> bool {
        self.super_classes.insert(parent)
    }

    /// Returns the class identifier.
    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Returns the optional class label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the optional class comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the parent classes in lexical order.
    #[must_use]
    pub fn parents(&self) -> &BTreeSet<Iri> {
        &self.super_classes
    }
}

/// Schema-level property declaration.
///
/// Datatype properties range over datatype identifiers (e.g. `xsd#string`)
/// which are not classes of the ontology; object properties range over
/// classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    id: Iri,
    label: Option<String>,
    kind: PropertyKind,
    domains: BTreeSet<Iri>,
    ranges: BTreeSet<Iri>,
}

impl Property {
    /// Creates a new property with the provided identifier and kind.
    #[must_use]
    pub fn new(id: Iri, kind: PropertyKind) -> Self {
        Self {
            id,
            label: None,
            kind,
            domains: BTreeSet::new(),
            ranges: BTreeSet::new(),
        }
    }

    /// Sets a human friendly label for the property.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Declares that the property applies to the supplied domain class.
    pub fn add_domain(&mut self, class: Iri) -> bool {
        self.domains.insert(class)
    }

    /// Declares the class or datatype the property values belong to.
    pub fn add_range(&mut self, range: Iri) -> bool {
        self.ranges.insert(range)
    }

    /// Returns the property identifier.
    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Returns the optional property label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns whether the property links individuals or holds literals.
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Returns the domain classes in lexical order.
    #[must_use]
    pub fn domains(&self) -> &BTreeSet<Iri> {
        &self.domains
    }

    /// Returns the range classes or datatypes in lexical order.
    #[must_use]
    pub fn ranges(&self) -> &BTreeSet<Iri> {
        &self.ranges
    }
}

/// Classifies the type of values a property can hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Object properties link individuals.
    #[serde(rename = "ObjectProperty")]
    Object,
    /// Datatype properties capture literal values.
    #[serde(rename = "DatatypeProperty")]
    Datatype,
}

impl PropertyKind {
    /// Interprets a declared property type.
    ///
    /// Accepts both the bare names (`ObjectProperty`) and full identifiers
    /// whose fragment names the kind (`...owl#DatatypeProperty`). Any other
    /// declaration is unsupported.
    #[must_use]
    pub fn from_declared(declared: &str) -> Option<Self> {
        let name = super::identifiers::element_of(declared).unwrap_or(declared);
        if name.contains("ObjectProperty") {
            Some(Self::Object)
        } else if name.contains("DatatypeProperty") {
            Some(Self::Datatype)
        } else {
            None
        }
    }

    /// Returns the OWL term naming this kind.
    #[must_use]
    pub fn owl_term(self) -> &'static str {
        match self {
            Self::Object => "ObjectProperty",
            Self::Datatype => "DatatypeProperty",
        }
    }
}

/// Property assertions attached to existing individuals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyAssertion {
    /// Object properties target another individual.
    Individual(Iri),
    /// Datatype properties store literal values.
    Literal(String),
}

/// An individual already present in the knowledge base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Individual {
    id: Iri,
    types: BTreeSet<Iri>,
    properties: BTreeMap<Iri, Vec<PropertyAssertion>>,
}

impl Individual {
    /// Creates a new individual with the supplied identifier.
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            types: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Declares that the individual is an instance of the given class.
    pub fn assert_type(&mut self, class: Iri) -> bool {
        self.types.insert(class)
    }

    /// Associates the individual with a property assertion.
    pub fn add_property_assertion(&mut self, property: Iri, assertion: PropertyAssertion) {
        self.properties.entry(property).or_default().push(assertion);
    }

    /// Returns the individual identifier.
    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Returns the classes the individual is asserted to belong to.
    #[must_use]
    pub fn types(&self) -> &BTreeSet<Iri> {
        &self.types
    }

    /// Returns the property assertions grouped by property.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<Iri, Vec<PropertyAssertion>> {
        &self.properties
    }
}

/// Read-only schema of one ontology together with its seeded individuals.
///
/// The aggregate only exists to seed a graph store; the validation engine
/// never reads it and queries the store instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ontology {
    id: Iri,
    label: Option<String>,
    classes: BTreeMap<Iri, Class>,
    properties: BTreeMap<Iri, Property>,
    individuals: BTreeMap<Iri, Individual>,
}

impl Ontology {
    /// Creates a new ontology aggregate identified by `<base><prefix>#`.
    #[must_use]
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            label: None,
            classes: BTreeMap::new(),
            properties: BTreeMap::new(),
            individuals: BTreeMap::new(),
        }
    }

    /// Sets a human friendly label for the ontology.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a class to the ontology, enforcing unique identifiers.
    pub fn add_class(&mut self, class: Class) -> Result<(), OntologyError> {
        let id = class.id().clone();
        if self.classes.contains_key(&id) {
            return Err(OntologyError::DuplicateClass(id));
        }
        self.classes.insert(id, class);
        Ok(())
    }

    /// Adds a property, validating its domains and, for object properties,
    /// its ranges against the known classes.
    pub fn add_property(&mut self, property: Property) -> Result<(), OntologyError> {
        let id = property.id().clone();
        if self.properties.contains_key(&id) {
            return Err(OntologyError::DuplicateProperty(id));
        }

        let mut referenced: Vec<&Iri> = property.domains().iter().collect();
        if property.kind() == PropertyKind::Object {
            referenced.extend(property.ranges());
        }
        if let Some(class) = referenced
            .into_iter()
            .find(|class| !self.classes.contains_key(*class))
        {
            return Err(OntologyError::MissingClass {
                ontology: self.id.clone(),
                class: class.clone(),
            });
        }

        self.properties.insert(id, property);
        Ok(())
    }

    /// Adds an individual ensuring it references known classes and properties.
    pub fn add_individual(&mut self, individual: Individual) -> Result<(), OntologyError> {
        let id = individual.id().clone();
        if self.individuals.contains_key(&id) {
            return Err(OntologyError::DuplicateIndividual(id));
        }

        for class in individual.types() {
            if !self.classes.contains_key(class) {
                return Err(OntologyError::MissingClass {
                    ontology: self.id.clone(),
                    class: class.clone(),
                });
            }
        }

        for (property_id, assertions) in individual.properties() {
            let Some(property) = self.properties.get(property_id) else {
                return Err(OntologyError::MissingProperty {
                    ontology: self.id.clone(),
                    property: property_id.clone(),
                });
            };

            for assertion in assertions {
                match (property.kind(), assertion) {
                    (PropertyKind::Object, PropertyAssertion::Individual(_))
                    | (PropertyKind::Datatype, PropertyAssertion::Literal(_)) => {}
                    _ => {
                        return Err(OntologyError::InvalidPropertyAssertion {
                            ontology: self.id.clone(),
                            property: property_id.clone(),
                        });
                    }
                }
            }
        }

        self.individuals.insert(id, individual);
        Ok(())
    }

    /// Returns the ontology identifier.
    #[must_use]
    pub fn id(&self) -> &Iri {
        &self.id
    }

    /// Returns the ontology prefix (`orgont` for `<base>orgont#`).
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.id.prefix()
    }

    /// Returns the optional ontology label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Looks up a class by identifier.
    #[must_use]
    pub fn class(&self, id: &Iri) -> Option<&Class> {
        self.classes.get(id)
    }

    /// Looks up a property by identifier.
    #[must_use]
    pub fn property(&self, id: &Iri) -> Option<&Property> {
        self.properties.get(id)
    }

    /// Looks up an individual by identifier.
    #[must_use]
    pub fn individual(&self, id: &Iri) -> Option<&Individual> {
        self.individuals.get(id)
    }

    /// Returns all classes ordered by identifier.
    #[must_use]
    pub fn classes(&self) -> &BTreeMap<Iri, Class> {
        &self.classes
    }

    /// Returns all properties ordered by identifier.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<Iri, Property> {
        &self.properties
    }

    /// Returns all individuals ordered by identifier.
    #[must_use]
    pub fn individuals(&self) -> &BTreeMap<Iri, Individual> {
        &self.individuals
    }
}

/// Errors raised when assembling an ontology aggregate.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OntologyError {
    #[error("class `{0}` already exists")]
    DuplicateClass(Iri),
    #[error("property `{0}` already exists")]
    DuplicateProperty(Iri),
    #[error("individual `{0}` already exists")]
    DuplicateIndividual(Iri),
    /// Referenced class was not part of the ontology.
    #[error("class `{class}` does not exist in ontology `{ontology}`")]
    MissingClass { ontology: Iri, class: Iri },
    /// Referenced property was not part of the ontology.
    #[error("property `{property}` does not exist in ontology `{ontology}`")]
    MissingProperty { ontology: Iri, property: Iri },
    /// Property assertion type did not match the property definition.
    #[error("property assertion does not match property `{property}` in ontology `{ontology}`")]
    InvalidPropertyAssertion { ontology: Iri, property: Iri },
}
