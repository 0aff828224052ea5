//! JSON seed documents describing an ontology schema and its individuals.
//!
//! ```json
//! {
//!   "prefix": "orgont",
//!   "classes": [{ "name": "Pump", "parents": ["Asset"] }],
//!   "properties": [
//!     { "name": "hasStatus", "kind": "DatatypeProperty",
//!       "domains": ["Pump"], "ranges": ["xsd:string"] }
//!   ],
//!   "individuals": [{ "name": "Hall", "class": "Location" }]
//! }
//! ```
//!
//! Names without a `#` are local to the document's prefix, except `xsd:`
//! names which resolve against the configured XML schema namespace.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use super::{
    entities::{
        Class, Individual, Ontology, OntologyError, Property, PropertyAssertion, PropertyKind,
    },
    identifiers::Namespaces,
    value_objects::{Iri, IriError},
};

const XSD_PREFIX: &str = "xsd:";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read ontology seed `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse ontology seed `{path}`: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("property `{property}` declares unsupported kind `{kind}`")]
    UnsupportedKind { property: String, kind: String },
    #[error(transparent)]
    Iri(#[from] IriError),
    #[error(transparent)]
    Ontology(#[from] OntologyError),
}

#[derive(Clone, Debug, Deserialize)]
pub struct OntologyDocument {
    pub prefix: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
    #[serde(default)]
    pub individuals: Vec<IndividualEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PropertyEntry {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub ranges: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IndividualEntry {
    pub name: String,
    #[serde(default, alias = "class")]
    pub classes: OneOrMany,
    /// Object assertions, property name to target individual.
    #[serde(default)]
    pub objects: BTreeMap<String, String>,
    /// Datatype assertions, property name to literal.
    #[serde(default)]
    pub literals: BTreeMap<String, String>,
}

/// Accepts either `"class": "Location"` or `"classes": ["Location", ...]`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn iter(&self) -> impl Iterator<Item = &String> {
        let items: &[String] = match self {
            Self::None => &[],
            Self::One(item) => std::slice::from_ref(item),
            Self::Many(items) => items,
        };
        items.iter()
    }
}

impl OntologyDocument {
    /// Reads and parses a seed file.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] when the file cannot be read or is not a valid
    /// seed document.
    pub fn from_path(path: &Path) -> Result<Self, SeedError> {
        let content = fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn resolve(&self, namespaces: &Namespaces, name: &str) -> Result<Iri, IriError> {
        if name.contains('#') {
            Iri::new(name)
        } else if let Some(datatype) = name.strip_prefix(XSD_PREFIX) {
            Iri::new(namespaces.xsd_uri(datatype))
        } else {
            Iri::new(namespaces.build_uri(&self.prefix, name))
        }
    }

    /// Builds the validated ontology aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] when an identifier is invalid, a property kind
    /// is unknown or an entry references an undeclared class or property.
    pub fn into_ontology(self, namespaces: &Namespaces) -> Result<Ontology, SeedError> {
        let mut ontology = Ontology::new(Iri::new(namespaces.ontology_uri(&self.prefix))?);
        if let Some(label) = &self.label {
            ontology = ontology.with_label(label.clone());
        }

        for entry in &self.classes {
            let mut class = Class::new(self.resolve(namespaces, &entry.name)?);
            if let Some(label) = &entry.label {
                class = class.with_label(label.clone());
            }
            if let Some(comment) = &entry.comment {
                class = class.with_comment(comment.clone());
            }
            for parent in &entry.parents {
                class.add_parent(self.resolve(namespaces, parent)?);
            }
            ontology.add_class(class)?;
        }

        for entry in &self.properties {
            let kind = PropertyKind::from_declared(&entry.kind).ok_or_else(|| {
                SeedError::UnsupportedKind {
                    property: entry.name.clone(),
                    kind: entry.kind.clone(),
                }
            })?;
            let mut property = Property::new(self.resolve(namespaces, &entry.name)?, kind);
            for domain in &entry.domains {
                property.add_domain(self.resolve(namespaces, domain)?);
            }
            for range in &entry.ranges {
                property.add_range(self.resolve(namespaces, range)?);
            }
            ontology.add_property(property)?;
        }

        for entry in &self.individuals {
            let mut individual = Individual::new(self.resolve(namespaces, &entry.name)?);
            for class in entry.classes.iter() {
                individual.assert_type(self.resolve(namespaces, class)?);
            }
            for (property, target) in &entry.objects {
                individual.add_property_assertion(
                    self.resolve(namespaces, property)?,
                    PropertyAssertion::Individual(self.resolve(namespaces, target)?),
                );
            }
            for (property, literal) in &entry.literals {
                individual.add_property_assertion(
                    self.resolve(namespaces, property)?,
                    PropertyAssertion::Literal(literal.clone()),
                );
            }
            ontology.add_individual(individual)?;
        }

        Ok(ontology)
    }
}
