//! Payloads - the partial matches that flow through the network.
//!
//! A payload pairs the fact(s) it stands for with the variables captured
//! along the way. Joins keep the left and right sides apart, so a complete
//! match always records which fact satisfied which part of a pattern.

mod bindings;

pub use bindings::*;

use std::sync::Arc;

use crate::facts::Fact;

/// The fact(s) a payload refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Match {
    /// The "no fact yet" sentinel used to seed `IsStarted` conditions.
    Start,

    /// A single asserted fact.
    Fact(Arc<Fact>),

    /// The conjunction produced by a join node.
    Join { left: Arc<Match>, right: Arc<Match> },
}

impl Match {
    /// Get the fact if this is a single-fact match.
    pub fn fact(&self) -> Option<&Arc<Fact>> {
        match self {
            Match::Fact(fact) => Some(fact),
            _ => None,
        }
    }

    /// All facts in this match, left to right.
    pub fn facts(&self) -> Vec<&Arc<Fact>> {
        let mut facts = Vec::new();
        let mut pending = vec![self];

        while let Some(current) = pending.pop() {
            match current {
                Match::Start => {}
                Match::Fact(fact) => facts.push(fact),
                Match::Join { left, right } => {
                    // Right goes on the stack first so left is visited first.
                    pending.push(right);
                    pending.push(left);
                }
            }
        }

        facts
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Match::Start)
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Match::Start => write!(f, "None"),
            Match::Fact(fact) => write!(f, "{}", fact),
            Match::Join { left, right } => write!(f, "({}, {})", left, right),
        }
    }
}

/// A match unit flowing through the network.
///
/// Two payloads are equal iff they refer to the same fact(s) in the same
/// positions and carry the same bindings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload {
    pub matched: Match,
    pub bindings: Bindings,
}

impl Payload {
    /// The start sentinel payload.
    pub fn start() -> Self {
        Self {
            matched: Match::Start,
            bindings: Bindings::new(),
        }
    }

    /// Wrap a single fact with no bindings.
    pub fn fact(fact: impl Into<Arc<Fact>>) -> Self {
        Self {
            matched: Match::Fact(fact.into()),
            bindings: Bindings::new(),
        }
    }

    /// Replace the bindings.
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Join two payloads, keeping both sides and merging both binding tables.
    ///
    /// Returns `None` when the sides bind the same variable to different values.
    pub fn join(left: &Payload, right: &Payload) -> Option<Payload> {
        let bindings = left.bindings.merge(&right.bindings)?;
        Some(Self {
            matched: Match::Join {
                left: Arc::new(left.matched.clone()),
                right: Arc::new(right.matched.clone()),
            },
            bindings,
        })
    }

    /// All facts this payload refers to, left to right.
    pub fn facts(&self) -> Vec<&Arc<Fact>> {
        self.matched.facts()
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bindings.is_empty() {
            write!(f, "{}", self.matched)
        } else {
            write!(f, "{} where {}", self.matched, self.bindings)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::Value;

    #[test]
    fn test_join_keeps_both_sides() {
        let left = Payload::fact(Fact::new().with("k1", "v1"));
        let right = Payload::fact(Fact::new().with("k2", "v1"));

        let joined = Payload::join(&left, &right).unwrap();
        let facts = joined.facts();

        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].get("k1"), Some(&Value::from("v1")));
        assert_eq!(facts[1].get("k2"), Some(&Value::from("v1")));
        assert_ne!(joined, Payload::join(&right, &left).unwrap());
    }

    #[test]
    fn test_join_merges_bindings() {
        let mut a = Bindings::new();
        a.bind("x", Binding::Value(Value::from(1)));
        let mut b = Bindings::new();
        b.bind("y", Binding::Value(Value::from(2)));

        let left = Payload::fact(Fact::new().with("x", 1)).with_bindings(a);
        let right = Payload::fact(Fact::new().with("y", 2)).with_bindings(b);

        let joined = Payload::join(&left, &right).unwrap();
        assert_eq!(joined.bindings.len(), 2);
        assert!(joined.bindings.get("x").is_some());
        assert!(joined.bindings.get("y").is_some());
    }

    #[test]
    fn test_join_rejects_conflicting_bindings() {
        let mut a = Bindings::new();
        a.bind("x", Binding::Value(Value::from(1)));
        let mut b = Bindings::new();
        b.bind("x", Binding::Value(Value::from(2)));

        let left = Payload::fact(Fact::new().with("x", 1)).with_bindings(a);
        let right = Payload::fact(Fact::new().with("x", 2)).with_bindings(b);

        assert!(Payload::join(&left, &right).is_none());
    }

    #[test]
    fn test_nested_join_facts_order() {
        let a = Payload::fact(Fact::new().with("n", 1));
        let b = Payload::fact(Fact::new().with("n", 2));
        let c = Payload::fact(Fact::new().with("n", 3));

        let ab = Payload::join(&a, &b).unwrap();
        let abc = Payload::join(&ab, &c).unwrap();

        let order: Vec<_> = abc.facts().iter().map(|f| f.get("n").cloned()).collect();
        assert_eq!(order, vec![Some(Value::Int(1)), Some(Value::Int(2)), Some(Value::Int(3))]);
    }

    #[test]
    fn test_start_payload() {
        let start = Payload::start();
        assert!(start.matched.is_start());
        assert!(start.facts().is_empty());
        assert_eq!(start.to_string(), "None");
    }
}
