//! Fact definitions - the documents asserted into the network.

mod value;

pub use value::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from building facts out of JSON.
#[derive(Debug, Error)]
pub enum FactError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("a fact must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("key {key:?} holds null, which facts cannot store")]
    NullValue { key: String },

    #[error("key {key:?} holds a nested object")]
    NestedObject { key: String },

    #[error("key {key:?} holds a number that fits neither i64 nor f64")]
    UnrepresentableNumber { key: String },
}

/// One asserted document: a map from string keys to scalar or array values.
///
/// Keys are kept ordered so that equality, hashing and the canonical text
/// form do not depend on insertion order. A fact is never mutated once it
/// has been handed to a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fact {
    fields: BTreeMap<String, Value>,
}

impl Fact {
    /// Create a new fact with no keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// The empty document `{}`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a field to this fact.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Parse a fact from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, FactError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Render the fact as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

impl TryFrom<serde_json::Value> for Fact {
    type Error = FactError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        let object = match json {
            serde_json::Value::Object(object) => object,
            serde_json::Value::Null => return Err(FactError::NotAnObject("null")),
            serde_json::Value::Bool(_) => return Err(FactError::NotAnObject("a boolean")),
            serde_json::Value::Number(_) => return Err(FactError::NotAnObject("a number")),
            serde_json::Value::String(_) => return Err(FactError::NotAnObject("a string")),
            serde_json::Value::Array(_) => return Err(FactError::NotAnObject("an array")),
        };

        let fields = object
            .into_iter()
            .map(|(key, value)| Value::from_json(value, &key).map(|value| (key, value)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self { fields })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fact {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", quoted(key), value)?;
        }
        write!(f, "}}")
    }
}
