//! Node interning - the registry that lets rules share identical nodes.

use std::collections::HashMap;

use fact_model::Condition;

/// The canonical identity of a node: its kind, its condition's canonical
/// form and its parents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeSignature {
    Root,
    Alpha {
        condition: String,
        parent: usize,
    },
    Beta {
        condition: String,
        left: usize,
        right: usize,
    },
    Leaf {
        parent: usize,
        rule: String,
        salience: i32,
    },
}

impl NodeSignature {
    pub fn alpha(condition: &Condition, parent: usize) -> Self {
        NodeSignature::Alpha {
            condition: condition.to_string(),
            parent,
        }
    }

    pub fn beta(condition: &Condition, left: usize, right: usize) -> Self {
        NodeSignature::Beta {
            condition: condition.to_string(),
            left,
            right,
        }
    }

    pub fn leaf(parent: usize, rule: &str, salience: i32) -> Self {
        NodeSignature::Leaf {
            parent,
            rule: rule.to_string(),
            salience,
        }
    }
}

/// Map from node signature to the arena slot of the node built for it.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<NodeSignature, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, signature: &NodeSignature) -> Option<usize> {
        self.entries.get(signature).copied()
    }

    pub fn insert(&mut self, signature: NodeSignature, index: usize) {
        self.entries.insert(signature, index);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
