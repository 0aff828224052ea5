//! Request documents submitted for validation.

use serde::{Deserialize, Serialize};

use super::entities::PropertyKind;

/// Proposed individual, as submitted by a client.
///
/// Accepts the plain keys as well as the `ont`-prefixed keys used by existing
/// clients (`ontName`, `ontOntology`, `ontClass`, `ontProperties`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateIndividual {
    #[serde(alias = "ontName")]
    pub name: String,
    #[serde(alias = "ontOntology")]
    pub ontology: String,
    #[serde(alias = "ontClass")]
    pub class: String,
    #[serde(alias = "ontProperties", default)]
    pub properties: Vec<PropertyAssignment>,
}

impl CandidateIndividual {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ontology: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ontology: ontology.into(),
            class: class.into(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, assignment: PropertyAssignment) -> Self {
        self.properties.push(assignment);
        self
    }

    /// Names of the properties the candidate assigns, in submission order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|property| property.name.as_str())
    }
}

/// One property value claimed by a candidate.
///
/// `kind` keeps the declared text so that unsupported declarations surface
/// as evaluation errors instead of failing deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyAssignment {
    #[serde(alias = "ontName")]
    pub name: String,
    #[serde(alias = "ontValue", default)]
    pub value: Option<String>,
    #[serde(alias = "ontDomain")]
    pub domain: String,
    #[serde(alias = "ontRange")]
    pub range: String,
    #[serde(rename = "type", alias = "ontType")]
    pub kind: String,
}

impl PropertyAssignment {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: Option<String>,
        domain: impl Into<String>,
        range: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            domain: domain.into(),
            range: range.into(),
            kind: kind.into(),
        }
    }

    /// Datatype assignment carrying a literal.
    #[must_use]
    pub fn datatype(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Some(value.into()),
            domain,
            range,
            PropertyKind::Datatype.owl_term(),
        )
    }

    /// Object assignment targeting the individual `target`.
    #[must_use]
    pub fn object(
        name: impl Into<String>,
        target: impl Into<String>,
        domain: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Some(target.into()),
            domain,
            range,
            PropertyKind::Object.owl_term(),
        )
    }

    /// Declared kind, `None` when the declaration is not supported.
    #[must_use]
    pub fn property_kind(&self) -> Option<PropertyKind> {
        PropertyKind::from_declared(&self.kind)
    }
}

/// Identity claimed by the request path, independent of the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionContext {
    /// Ontology prefix, e.g. `orgont`.
    pub ontology_name: String,
    /// Local name of the individual, e.g. `Pump1`.
    pub individual_name: String,
}

impl SubmissionContext {
    #[must_use]
    pub fn new(ontology_name: impl Into<String>, individual_name: impl Into<String>) -> Self {
        Self {
            ontology_name: ontology_name.into(),
            individual_name: individual_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_plain_documents() {
        let candidate: CandidateIndividual = serde_json::from_value(serde_json::json!({
            "name": "http://kb.local/owl/orgont#Pump1",
            "ontology": "http://kb.local/owl/orgont#",
            "class": "http://kb.local/owl/orgont#Pump",
            "properties": [{
                "name": "http://kb.local/owl/orgont#hasStatus",
                "value": "Running",
                "domain": "http://kb.local/owl/orgont#Pump",
                "range": "http://www.w3.org/2001/XMLSchema#string",
                "type": "DatatypeProperty"
            }]
        }))
        .expect("candidate");

        assert_eq!(candidate.properties.len(), 1);
        assert_eq!(
            candidate.properties[0].property_kind(),
            Some(PropertyKind::Datatype)
        );
        assert_eq!(
            candidate.property_names().collect::<Vec<_>>(),
            vec!["http://kb.local/owl/orgont#hasStatus"]
        );
    }

    #[test]
    fn reads_prefixed_documents_with_null_values() {
        let candidate: CandidateIndividual = serde_json::from_value(serde_json::json!({
            "ontName": "http://kb.local/owl/orgont#Pump1",
            "ontOntology": "http://kb.local/owl/orgont#",
            "ontClass": "http://kb.local/owl/orgont#Pump",
            "ontProperties": [{
                "ontName": "http://kb.local/owl/orgont#hasLocation",
                "ontValue": null,
                "ontDomain": "http://kb.local/owl/orgont#Pump",
                "ontRange": "http://kb.local/owl/orgont#Location",
                "ontType": "http://www.w3.org/2002/07/owl#ObjectProperty"
            }]
        }))
        .expect("candidate");

        let property = &candidate.properties[0];
        assert_eq!(property.value, None);
        assert_eq!(property.property_kind(), Some(PropertyKind::Object));
    }

    #[test]
    fn properties_default_to_empty() {
        let candidate: CandidateIndividual = serde_json::from_str(
            r#"{"name":"a#b","ontology":"a#","class":"a#C"}"#,
        )
        .expect("candidate");
        assert!(candidate.properties.is_empty());
    }
}
