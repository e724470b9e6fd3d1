//! Variable bindings captured while matching.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::facts::{Fact, Value};

/// What a pattern variable is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    /// A field value, from `{$v = "key": _}`.
    Value(Value),
    /// A whole fact, from `$a = {...}`.
    Fact(Arc<Fact>),
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Binding::Value(value) => write!(f, "{}", value),
            Binding::Fact(fact) => write!(f, "{}", fact),
        }
    }
}

/// The table of captured variables carried by a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bindings {
    table: BTreeMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable.
    ///
    /// Returns `false` and leaves the table untouched if the variable is
    /// already bound to something else.
    pub fn bind(&mut self, variable: impl Into<String>, binding: Binding) -> bool {
        let variable = variable.into();
        match self.table.get(&variable) {
            Some(existing) => *existing == binding,
            None => {
                self.table.insert(variable, binding);
                true
            }
        }
    }

    /// Merge two tables.
    ///
    /// Every binding from both sides is kept; a variable bound on both sides
    /// must agree, otherwise the merge fails.
    pub fn merge(&self, other: &Bindings) -> Option<Bindings> {
        let mut merged = self.clone();
        for (variable, binding) in &other.table {
            if !merged.bind(variable.clone(), binding.clone()) {
                return None;
            }
        }
        Some(merged)
    }

    pub fn get(&self, variable: &str) -> Option<&Binding> {
        self.table.get(variable)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Binding)> {
        self.table.iter()
    }
}

impl std::fmt::Display for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (variable, binding)) in self.table.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "${} = {}", variable, binding)?;
        }
        Ok(())
    }
}
