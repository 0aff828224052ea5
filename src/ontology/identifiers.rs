//! Translation between global identifiers and the store's compact notation.
//!
//! Global identifiers follow `<base><prefix>#<name>`. Inside the graph store
//! the same element is named `<prefix>__<name>` (labels, relation types and
//! attribute keys), the notation used by neosemantics imports.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Separator between the ontology prefix and the element name in compact form.
pub const COMPACT_MARKER: &str = "__";
/// Reserved prefix mapped to [`Namespaces::owl_url`] instead of the base URL.
pub const OWL_PREFIX: &str = "owl";

pub const DEFAULT_BASE_URL: &str = "http://138.250.108.1:3003/api/files/owl/";
pub const DEFAULT_OWL_URL: &str = "http://www.w3.org/2002/07/owl";
pub const DEFAULT_XSD_URL: &str = "http://www.w3.org/2001/XMLSchema";

const FRESH_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Returns the element name: the text after the first `#`.
#[must_use]
pub fn element_of(uri: &str) -> Option<&str> {
    uri.split('#').nth(1)
}

/// Returns the ontology prefix: the last path segment before `#`.
#[must_use]
pub fn ontology_of(uri: &str) -> Option<&str> {
    let segment = uri.rsplit('/').next()?;
    let prefix = segment.split('#').next()?;
    (!prefix.is_empty()).then_some(prefix)
}

/// Strips the `prefix__` marker from a compact name.
///
/// Returns `None` when the name carries no marker or when the marker belongs
/// to another ontology; cross-ontology names are never translated.
#[must_use]
pub fn local_name<'a>(prefix: &str, compact: &'a str) -> Option<&'a str> {
    let mut parts = compact.split(COMPACT_MARKER);
    match (parts.next(), parts.next()) {
        (Some(marker), Some(name)) if marker == prefix => Some(name),
        _ => None,
    }
}

/// Returns the compact `prefix__name` form of a global identifier.
#[must_use]
pub fn compact_of(uri: &str) -> Option<String> {
    let prefix = ontology_of(uri)?;
    let name = element_of(uri).filter(|name| !name.is_empty())?;
    Some(format!("{prefix}{COMPACT_MARKER}{name}"))
}

/// Base addresses used to build and resolve global identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespaces {
    /// Base URL of the proprietary ontologies, ending with `/`.
    pub base_url: String,
    /// OWL namespace, without the trailing `#`.
    pub owl_url: String,
    /// XML schema datatypes namespace, without the trailing `#`.
    pub xsd_url: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            owl_url: DEFAULT_OWL_URL.to_string(),
            xsd_url: DEFAULT_XSD_URL.to_string(),
        }
    }
}

impl Namespaces {
    /// Creates namespaces rooted at the supplied proprietary base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds `<base><prefix>#<name>`.
    #[must_use]
    pub fn build_uri(&self, prefix: &str, name: &str) -> String {
        format!("{}{prefix}#{name}", self.base_url)
    }

    /// Builds the ontology identifier `<base><prefix>#`.
    #[must_use]
    pub fn ontology_uri(&self, prefix: &str) -> String {
        self.build_uri(prefix, "")
    }

    /// Builds an XML schema datatype identifier such as `xsd#string`.
    #[must_use]
    pub fn xsd_uri(&self, datatype: &str) -> String {
        format!("{}#{datatype}", self.xsd_url)
    }

    /// Resolves a compact name back to its global identifier.
    #[must_use]
    pub fn to_uri(&self, compact: &str) -> Option<String> {
        let mut parts = compact.split(COMPACT_MARKER);
        let (Some(marker), Some(name)) = (parts.next(), parts.next()) else {
            return None;
        };
        if marker == OWL_PREFIX {
            Some(format!("{}#{name}", self.owl_url))
        } else {
            Some(self.build_uri(marker, name))
        }
    }

    /// Generates an identifier for an individual created on behalf of a class.
    ///
    /// The suffix is the local time at second resolution; no uniqueness check
    /// is made, so two generations within the same second collide.
    #[must_use]
    pub fn fresh_individual_uri(&self, prefix: &str, class_name: &str) -> String {
        self.fresh_individual_uri_at(prefix, class_name, &Local::now())
    }

    /// Same as [`Self::fresh_individual_uri`] with an explicit timestamp.
    #[must_use]
    pub fn fresh_individual_uri_at(
        &self,
        prefix: &str,
        class_name: &str,
        at: &DateTime<Local>,
    ) -> String {
        let stamp = at.format(FRESH_TIMESTAMP_FORMAT);
        self.build_uri(prefix, &format!("{class_name}_{stamp}"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use rstest::rstest;

    use super::*;

    const PUMP: &str = "http://138.250.108.1:3003/api/files/owl/orgont#Pump";

    #[rstest]
    #[case(PUMP, Some("Pump"))]
    #[case("http://138.250.108.1:3003/api/files/owl/orgont#", Some(""))]
    #[case("http://example.org/no-fragment", None)]
    #[case("a#b#c", Some("b"))]
    fn element_follows_first_hash(#[case] uri: &str, #[case] expected: Option<&str>) {
        assert_eq!(element_of(uri), expected);
    }

    #[rstest]
    #[case(PUMP, Some("orgont"))]
    #[case("http://www.w3.org/2001/XMLSchema#string", Some("XMLSchema"))]
    #[case("http://example.org/", None)]
    #[case("orgont#Pump", Some("orgont"))]
    fn ontology_is_last_segment_before_hash(#[case] uri: &str, #[case] expected: Option<&str>) {
        assert_eq!(ontology_of(uri), expected);
    }

    #[test]
    fn local_name_rejects_foreign_prefix() {
        assert_eq!(local_name("orgont", "orgont__hasStatus"), Some("hasStatus"));
        assert_eq!(local_name("orgont", "diagont__hasStatus"), None);
        assert_eq!(local_name("orgont", "hasStatus"), None);
    }

    #[test]
    fn compact_form_requires_prefix_and_name() {
        assert_eq!(compact_of(PUMP).as_deref(), Some("orgont__Pump"));
        assert_eq!(compact_of("http://138.250.108.1:3003/api/files/owl/orgont#"), None);
        assert_eq!(compact_of("http://example.org/plain"), None);
    }

    #[test]
    fn compact_names_resolve_to_owl_or_base() {
        let namespaces = Namespaces::default();
        assert_eq!(
            namespaces.to_uri("owl__NamedIndividual").as_deref(),
            Some("http://www.w3.org/2002/07/owl#NamedIndividual")
        );
        assert_eq!(namespaces.to_uri("orgont__Pump").as_deref(), Some(PUMP));
        assert_eq!(namespaces.to_uri("Pump"), None);
    }

    #[test]
    fn uris_are_built_from_base() {
        let namespaces = Namespaces::with_base_url("http://kb.local/owl/");
        assert_eq!(namespaces.build_uri("orgont", "Pump1"), "http://kb.local/owl/orgont#Pump1");
        assert_eq!(namespaces.ontology_uri("orgont"), "http://kb.local/owl/orgont#");
        assert_eq!(
            namespaces.xsd_uri("string"),
            "http://www.w3.org/2001/XMLSchema#string"
        );
    }

    #[test]
    fn fresh_uri_carries_second_resolution_stamp() {
        let namespaces = Namespaces::with_base_url("http://kb.local/owl/");
        let at = Local
            .with_ymd_and_hms(2019, 8, 7, 9, 5, 3)
            .single()
            .expect("unambiguous local time");
        assert_eq!(
            namespaces.fresh_individual_uri_at("orgont", "Location", &at),
            "http://kb.local/owl/orgont#Location_2019-08-07T09-05-03"
        );
    }

    #[test]
    fn fresh_uri_belongs_to_requested_ontology() {
        let namespaces = Namespaces::default();
        let uri = namespaces.fresh_individual_uri("orgont", "Location");
        assert_eq!(ontology_of(&uri), Some("orgont"));
        assert!(element_of(&uri).is_some_and(|name| name.starts_with("Location_")));
    }
}
