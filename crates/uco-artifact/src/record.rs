//! Forensic input records
//!
//! A [`Record`] is one observation: a JSON object mapping field names to
//! scalar or nested values. [`RecordSet`] normalises the raw input shapes a
//! caller may hand over into an ordered list of records.

use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One forensic observation
///
/// # Invariants
/// - Always a JSON object (never a scalar or array)
/// - Fingerprint is independent of key insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create from a JSON object
    #[inline]
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Convert any JSON value into a record
    ///
    /// # Errors
    /// Returns error if the value is not an object
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(RecordError::NotAnObject {
                index: 0,
                found: json_kind(&other),
            }),
        }
    }

    /// Convert any serializable value into a record
    ///
    /// # Errors
    /// Returns error if the value has no JSON representation or is not an object
    pub fn from_serializable<T>(value: &T) -> Result<Self, RecordError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_value(value).map_err(RecordError::Unserializable)?;
        Self::from_value(json)
    }

    /// Field map
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Field names
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Field value by name
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the record has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Content fingerprint
    ///
    /// O(n) in the record size.
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_object(&self.0)
    }

    /// Consume into the field map
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Ordered list of records, normalised from caller input
///
/// Accepted shapes:
/// - an array of objects
/// - an object with a `records` array
/// - a single non-empty object (one record)
///
/// Empty objects, empty arrays and scalar inputs yield zero records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet(Vec<Record>);

impl RecordSet {
    /// Create from records
    #[inline]
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self(records)
    }

    /// Normalise a raw JSON input
    ///
    /// # Errors
    /// Returns [`RecordError::NotAnObject`] if a list element is not an object
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Array(items) => {
                tracing::debug!(count = items.len(), "records supplied as list");
                Self::from_items(items)
            }
            Value::Object(mut map) => {
                if let Some(Value::Array(_)) = map.get("records") {
                    if let Some(Value::Array(items)) = map.remove("records") {
                        tracing::debug!(count = items.len(), "records supplied under `records` key");
                        return Self::from_items(items);
                    }
                }
                if map.is_empty() {
                    tracing::warn!("empty object input, no records to plan");
                    Ok(Self::default())
                } else {
                    tracing::debug!("single record supplied as object");
                    Ok(Self(vec![Record(map)]))
                }
            }
            other => {
                tracing::warn!(kind = json_kind(&other), "unsupported input shape, no records to plan");
                Ok(Self::default())
            }
        }
    }

    /// Parse and normalise a JSON document
    ///
    /// # Errors
    /// Returns error if the JSON is invalid or contains a non-object record
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(json).map_err(RecordError::InvalidJson)?;
        Self::from_value(value)
    }

    /// Normalise any serializable input
    ///
    /// # Errors
    /// Returns error if the input has no JSON representation
    pub fn from_serializable<T>(value: &T) -> Result<Self, RecordError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_value(value).map_err(RecordError::Unserializable)?;
        Self::from_value(json)
    }

    fn from_items(items: Vec<Value>) -> Result<Self, RecordError> {
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(Record(map)),
                other => Err(RecordError::NotAnObject {
                    index,
                    found: json_kind(&other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Records in input order
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no records
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate records
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    /// Consume into records
    #[inline]
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.0
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors raised while building records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// A record position holds something other than an object
    #[error("record {index} is a {found}, expected an object")]
    NotAnObject { index: usize, found: &'static str },

    /// Input document is not valid JSON
    #[error("invalid JSON input: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Input has no JSON representation
    #[error("input cannot be represented as JSON: {0}")]
    Unserializable(#[source] serde_json::Error),
}
