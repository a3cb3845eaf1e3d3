//! Ontology map
//!
//! Typed description of the CASE/UCO schema subset relevant to one input:
//! observable-object classes, facets, property ownership and relationships.
//! Every field is optional on the wire and defaults to an empty collection.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uco_artifact::Fingerprint;

/// Schema description supplied by the ontology research step
///
/// # Defaults
/// Missing keys, and keys explicitly set to `null`, become empty
/// collections. Unknown keys (`artifacts`, `analysis`, ...) are ignored.
///
/// # Errors
/// A known key holding the wrong shape (`"classes": "File"`, a number in
/// `facets`) is rejected with [`OntologyError`] rather than coerced.
/// Only a whole input that is not an object falls back to the empty map
/// (see [`OntologyMap::from_value`]).
///
/// # Example
/// ```
/// use uco_ontology::OntologyMap;
///
/// let map = OntologyMap::from_json(r#"{"classes": ["File"]}"#).unwrap();
/// assert_eq!(map.classes, vec!["File".to_string()]);
/// assert!(map.facets.is_empty());
/// assert!(map.relationships.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OntologyMap {
    /// Observable-object class names
    #[serde(default, deserialize_with = "null_as_default")]
    pub classes: Vec<String>,

    /// Facet (property bundle) names
    #[serde(default, deserialize_with = "null_as_default")]
    pub facets: Vec<String>,

    /// Owner name (class or facet) to the property names it owns
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: IndexMap<String, Vec<String>>,

    /// Relationship descriptors
    #[serde(default, deserialize_with = "null_as_default")]
    pub relationships: Vec<RelationshipDescriptor>,
}

impl OntologyMap {
    /// Create an empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With class names
    #[must_use]
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    /// With facet names
    #[must_use]
    pub fn with_facets<I, S>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets = facets.into_iter().map(Into::into).collect();
        self
    }

    /// With the properties owned by one class or facet
    #[must_use]
    pub fn with_properties<I, S>(mut self, owner: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties
            .insert(owner.into(), properties.into_iter().map(Into::into).collect());
        self
    }

    /// With one relationship descriptor appended
    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipDescriptor) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if the JSON is invalid or a field has the wrong shape
    pub fn from_json(json: &str) -> Result<Self, OntologyError> {
        serde_json::from_str(json).map_err(OntologyError::InvalidJson)
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if the YAML is invalid or a field has the wrong shape
    pub fn from_yaml(yaml: &str) -> Result<Self, OntologyError> {
        serde_yaml::from_str(yaml).map_err(OntologyError::InvalidYaml)
    }

    /// Convert from a JSON value
    ///
    /// A non-object value is treated as an empty map.
    ///
    /// # Errors
    /// Returns error if a field has the wrong shape
    pub fn from_value(value: Value) -> Result<Self, OntologyError> {
        if value.is_object() {
            serde_json::from_value(value).map_err(OntologyError::InvalidJson)
        } else {
            tracing::warn!("ontology map is not an object, treating as empty");
            Ok(Self::default())
        }
    }

    /// True when nothing is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.facets.is_empty()
            && self.properties.is_empty()
            && self.relationships.is_empty()
    }

    /// Declared class name matching `name` case-insensitively
    #[must_use]
    pub fn class_named(&self, name: &str) -> Option<&str> {
        find_case_insensitive(&self.classes, name)
    }

    /// Declared facet name matching `name` case-insensitively
    #[must_use]
    pub fn facet_named(&self, name: &str) -> Option<&str> {
        find_case_insensitive(&self.facets, name)
    }

    /// True if `name` is a declared facet (case-insensitive)
    #[inline]
    #[must_use]
    pub fn is_facet(&self, name: &str) -> bool {
        self.facet_named(name).is_some()
    }

    /// Fingerprint of the whole map
    ///
    /// Changes whenever any declaration changes, including order.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_value(&self.to_value())
    }

    fn to_value(&self) -> Value {
        // Owner order is significant (first owner wins), so keep it as a list of pairs
        let properties = self
            .properties
            .iter()
            .map(|(owner, props)| Value::Array(vec![Value::String(owner.clone()), string_array(props)]))
            .collect();

        let mut map = Map::new();
        map.insert("classes".into(), string_array(&self.classes));
        map.insert("facets".into(), string_array(&self.facets));
        map.insert("properties".into(), Value::Array(properties));
        map.insert(
            "relationships".into(),
            Value::Array(self.relationships.iter().map(RelationshipDescriptor::to_value).collect()),
        );
        Value::Object(map)
    }
}

/// One relationship declared by the ontology map
///
/// Only `type` / `kind` are interpreted; every other field is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    /// Declared relationship type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,

    /// Alternative spelling used by some producers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Remaining descriptor fields (source, target, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RelationshipDescriptor {
    /// Descriptor with a `type`
    #[must_use]
    pub fn of_type(relationship_type: impl Into<String>) -> Self {
        Self {
            relationship_type: Some(relationship_type.into()),
            ..Self::default()
        }
    }

    /// Descriptor with a `kind`
    #[must_use]
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// `type`, falling back to `kind`; blank values are ignored
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        [self.relationship_type.as_deref(), self.kind.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        if let Some(t) = &self.relationship_type {
            map.insert("type".into(), Value::String(t.clone()));
        }
        if let Some(k) = &self.kind {
            map.insert("kind".into(), Value::String(k.clone()));
        }
        Value::Object(map)
    }
}

fn find_case_insensitive<'a>(names: &'a [String], name: &str) -> Option<&'a str> {
    names
        .iter()
        .find(|candidate| candidate.to_lowercase() == name.to_lowercase())
        .map(String::as_str)
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors raised while loading an ontology map
#[derive(Debug, thiserror::Error)]
pub enum OntologyError {
    /// JSON parse or shape error
    #[error("invalid ontology JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// YAML parse or shape error
    #[error("invalid ontology YAML: {0}")]
    InvalidYaml(#[source] serde_yaml::Error),
}
