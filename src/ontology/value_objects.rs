use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identifiers;

/// Value object ensuring that supplied text represents a valid IRI.
///
/// Schema elements (ontologies, classes, properties and seeded individuals)
/// are addressed with `<base>/<prefix>#<name>` identifiers; the accessors
/// below expose both halves without re-parsing at every call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    ///
    /// The constructor rejects malformed identifiers in order to guarantee that
    /// every seeded schema element uses canonical identifiers.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the element name following `#`, if any.
    #[must_use]
    pub fn element(&self) -> Option<&str> {
        identifiers::element_of(&self.value)
    }

    /// Returns the ontology prefix, i.e. the last path segment before `#`.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        identifiers::ontology_of(&self.value)
    }

    /// Returns the store-internal `prefix__name` form of the identifier.
    #[must_use]
    pub fn compact(&self) -> Option<String> {
        identifiers::compact_of(&self.value)
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Iri> for String {
    fn from(value: Iri) -> Self {
        value.value
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}

#[cfg(test)]
mod tests {
    use super::Iri;

    #[test]
    fn accepts_valid_iri() {
        let iri =
            Iri::new("http://138.250.108.1:3003/api/files/owl/orgont#Pump").expect("valid IRI");
        assert_eq!(iri.element(), Some("Pump"));
        assert_eq!(iri.prefix(), Some("orgont"));
        assert_eq!(iri.compact().as_deref(), Some("orgont__Pump"));
    }

    #[test]
    fn rejects_invalid_iri() {
        let err = Iri::new("not an iri").expect_err("invalid IRI");
        assert!(matches!(err, super::IriError::Invalid { value } if value == "not an iri"));
    }

    #[test]
    fn deserializes_through_validation() {
        let iri: Iri = serde_json::from_str("\"https://example.org/onto#Thing\"").expect("valid");
        assert_eq!(iri.as_str(), "https://example.org/onto#Thing");

        let err = serde_json::from_str::<Iri>("\"not an iri\"");
        assert!(err.is_err());
    }
}
