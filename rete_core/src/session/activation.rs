//! Activations - the records leaf nodes emit for complete matches.

use fact_model::Payload;
use std::cmp::Ordering;

use crate::network::NodeId;

/// One newly completed match of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Rule name carried by the leaf.
    pub rule: String,

    /// Priority from the rule's `@` weighting; higher fires first.
    pub salience: i32,

    /// The complete match, with the facts of every branch and all bindings.
    pub payload: Payload,

    /// The leaf node that produced this activation.
    pub leaf: NodeId,

    /// Discovery order across the whole network, starting at 1.
    pub sequence: u64,
}

impl Activation {
    /// Agenda order: higher salience first, then earlier discovery first.
    pub fn agenda_order(&self, other: &Self) -> Ordering {
        other
            .salience
            .cmp(&self.salience)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl std::fmt::Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @{}: {}", self.rule, self.salience, self.payload)
    }
}
