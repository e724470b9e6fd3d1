//! Tests applied to a single value: array elements and captured keys.

use serde::{Deserialize, Serialize};

use crate::facts::{Value, ValueType};

/// A test on one value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementTest {
    /// The value equals this one (bool, int and float stay distinct).
    Equals(Value),
    /// The value has this type.
    OfType(ValueType),
}

impl ElementTest {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ElementTest::Equals(expected) => value == expected,
            ElementTest::OfType(value_type) => value.value_type() == *value_type,
        }
    }
}

impl std::fmt::Display for ElementTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementTest::Equals(value) => write!(f, "{}", value),
            ElementTest::OfType(value_type) => write!(f, "{}", value_type),
        }
    }
}
