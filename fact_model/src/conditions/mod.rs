//! Conditions - the compiled predicates that alpha and beta nodes test.
//!
//! Conditions form a closed set. Each one has a canonical text form (its
//! `Display` output) that is unique per variant and parameters; the network
//! uses it as part of the key under which nodes are shared between rules.
//!
//! | Variant | Canonical form |
//! |---|---|
//! | `IsStarted` | `None` |
//! | `Always` | `_` |
//! | `IsEmpty` | `{}` |
//! | `NotEmpty` | `{...}` |
//! | `HasKey` | `{"key": _}` |
//! | `HasType` | `{"key": int}` |
//! | `HasValue` | `{"key": 5}` |
//! | `Capture` | `{$v = "key": _}` |
//! | `BindFact` | `$a = {...}` |
//! | `All` | `({"a": _} & {"b": 1})` |
//! | `Not` | `not {"key": _}` |
//! | `ForAll` / `Exists` | `all {"key": int}` / `exist {"key": 5}` |
//! | `Join` | `({"k1": "v1"}, {"k2": "v1"})` |

mod element;

pub use element::*;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

use crate::facts::{quoted, Fact, Value, ValueType};
use crate::payload::{Binding, Bindings, Match, Payload};

/// A pure predicate over one payload (alpha) or a pair of payloads (beta).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Holds only for the start sentinel.
    IsStarted,

    /// Holds for anything. Used for unconstrained joins.
    Always,

    /// The fact has no keys.
    IsEmpty,

    /// The fact has at least one key.
    NotEmpty,

    /// The key is present, whatever its value.
    HasKey(String),

    /// The key is present and its value has the given type.
    HasType { key: String, value_type: ValueType },

    /// The key is present and its value equals `value`.
    HasValue { key: String, value: Value },

    /// The key is present (and passes `test`, if any); its value is bound to `variable`.
    Capture {
        variable: String,
        key: String,
        test: Option<ElementTest>,
    },

    /// `inner` holds; the whole fact is bound to `variable`.
    BindFact {
        variable: String,
        inner: Box<Condition>,
    },

    /// Every clause holds.
    All(Vec<Condition>),

    /// The inner condition does not hold.
    Not(Box<Condition>),

    /// The key holds an array whose every element passes `test`.
    ForAll { key: String, test: ElementTest },

    /// The key holds an array with at least one element passing `test`.
    Exists { key: String, test: ElementTest },

    /// Two-input test: `left` holds on the left payload and `right` on the right one.
    Join {
        left: Box<Condition>,
        right: Box<Condition>,
    },
}

impl Condition {
    pub fn has_key(key: impl Into<String>) -> Self {
        Condition::HasKey(key.into())
    }

    pub fn has_type(key: impl Into<String>, value_type: ValueType) -> Self {
        Condition::HasType {
            key: key.into(),
            value_type,
        }
    }

    pub fn has_value(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::HasValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `{$variable = "key": _}`
    pub fn capture(variable: impl Into<String>, key: impl Into<String>) -> Self {
        Condition::Capture {
            variable: variable.into(),
            key: key.into(),
            test: None,
        }
    }

    /// `{$variable = "key": <test>}`
    pub fn capture_where(variable: impl Into<String>, key: impl Into<String>, test: ElementTest) -> Self {
        Condition::Capture {
            variable: variable.into(),
            key: key.into(),
            test: Some(test),
        }
    }

    /// `$variable = <inner>`
    pub fn bind_fact(variable: impl Into<String>, inner: Condition) -> Self {
        Condition::BindFact {
            variable: variable.into(),
            inner: Box::new(inner),
        }
    }

    pub fn all(clauses: impl IntoIterator<Item = Condition>) -> Self {
        Condition::All(clauses.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Condition) -> Self {
        Condition::Not(Box::new(inner))
    }

    pub fn for_all(key: impl Into<String>, test: ElementTest) -> Self {
        Condition::ForAll { key: key.into(), test }
    }

    pub fn exists(key: impl Into<String>, test: ElementTest) -> Self {
        Condition::Exists { key: key.into(), test }
    }

    pub fn join(left: Condition, right: Condition) -> Self {
        Condition::Join {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Whether this condition needs two inputs.
    pub fn is_join(&self) -> bool {
        matches!(self, Condition::Join { .. })
    }

    /// Evaluate the condition.
    ///
    /// Single-input conditions test `left` and ignore `right`. A `Join`
    /// needs both sides and is false without a right payload.
    pub fn is_met(&self, left: &Payload, right: Option<&Payload>) -> bool {
        match self {
            Condition::Join {
                left: left_test,
                right: right_test,
            } => {
                left_test.holds_on(left) && right.is_some_and(|right| right_test.holds_on(right))
            }
            _ => self.holds_on(left),
        }
    }

    /// The variables this condition binds on a payload it accepts.
    ///
    /// Returns `None` when the condition binds one variable to two
    /// different values, which makes the repeated variable an equality test.
    pub fn captures(&self, payload: &Payload) -> Option<Bindings> {
        let mut bindings = Bindings::new();
        let source = match &payload.matched {
            Match::Start => return Some(bindings),
            Match::Fact(fact) => Some(fact),
            Match::Join { .. } => payload.facts().into_iter().find(|fact| self.test(fact)),
        };

        match source {
            Some(fact) if !self.collect(fact, &mut bindings) => None,
            _ => Some(bindings),
        }
    }

    /// The variables a two-input condition binds on an accepted pair.
    ///
    /// Each side's clause captures from its own payload and both tables are
    /// merged; `None` when they bind one variable to different values.
    /// Single-input conditions capture from `left` only.
    pub fn captures_pair(&self, left: &Payload, right: &Payload) -> Option<Bindings> {
        match self {
            Condition::Join {
                left: left_test,
                right: right_test,
            } => left_test.captures(left)?.merge(&right_test.captures(right)?),
            _ => self.captures(left),
        }
    }

    /// Single-input evaluation. Against a join, holds if any fact in it
    /// does; a negation holds only if no fact satisfies its inner condition.
    fn holds_on(&self, payload: &Payload) -> bool {
        match (&payload.matched, self) {
            (Match::Start, _) => matches!(self, Condition::IsStarted | Condition::Always),
            (Match::Fact(fact), _) => self.test(fact),
            (Match::Join { .. }, Condition::Not(inner)) => !inner.holds_on(payload),
            (Match::Join { .. }, _) => payload.facts().iter().any(|fact| self.test(fact)),
        }
    }

    fn test(&self, fact: &Fact) -> bool {
        match self {
            Condition::IsStarted => false,
            Condition::Always => true,
            Condition::IsEmpty => fact.is_empty(),
            Condition::NotEmpty => !fact.is_empty(),
            Condition::HasKey(key) => fact.contains_key(key),
            Condition::HasType { key, value_type } => fact
                .get(key)
                .is_some_and(|value| value.value_type() == *value_type),
            Condition::HasValue { key, value } => fact.get(key) == Some(value),
            Condition::Capture { key, test, .. } => match (fact.get(key), test) {
                (Some(value), Some(test)) => test.matches(value),
                (Some(_), None) => true,
                (None, _) => false,
            },
            Condition::BindFact { inner, .. } => inner.test(fact),
            Condition::All(clauses) => clauses.iter().all(|clause| clause.test(fact)),
            Condition::Not(inner) => !inner.test(fact),
            Condition::ForAll { key, test } => fact
                .get(key)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().all(|item| test.matches(item))),
            Condition::Exists { key, test } => fact
                .get(key)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| test.matches(item))),
            Condition::Join { .. } => false,
        }
    }

    fn collect(&self, fact: &Arc<Fact>, bindings: &mut Bindings) -> bool {
        match self {
            Condition::Capture { variable, key, .. } => match fact.get(key) {
                Some(value) => bindings.bind(variable.clone(), Binding::Value(value.clone())),
                None => true,
            },
            Condition::BindFact { variable, inner } => {
                bindings.bind(variable.clone(), Binding::Fact(Arc::clone(fact)))
                    && inner.collect(fact, bindings)
            }
            Condition::All(clauses) => clauses.iter().all(|clause| clause.collect(fact, bindings)),
            // Negated clauses never bind.
            _ => true,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::IsStarted => write!(f, "None"),
            Condition::Always => write!(f, "_"),
            Condition::IsEmpty => write!(f, "{{}}"),
            Condition::NotEmpty => write!(f, "{{...}}"),
            Condition::HasKey(key) => write!(f, "{{{}: _}}", quoted(key)),
            Condition::HasType { key, value_type } => write!(f, "{{{}: {}}}", quoted(key), value_type),
            Condition::HasValue { key, value } => write!(f, "{{{}: {}}}", quoted(key), value),
            Condition::Capture { variable, key, test } => match test {
                Some(test) => write!(f, "{{${} = {}: {}}}", variable_name(variable), quoted(key), test),
                None => write!(f, "{{${} = {}: _}}", variable_name(variable), quoted(key)),
            },
            Condition::BindFact { variable, inner } => write!(f, "${} = {}", variable_name(variable), inner),
            Condition::All(clauses) => {
                write!(f, "(")?;
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{}", clause)?;
                }
                write!(f, ")")
            }
            Condition::Not(inner) => write!(f, "not {}", inner),
            Condition::ForAll { key, test } => write!(f, "all {{{}: {}}}", quoted(key), test),
            Condition::Exists { key, test } => write!(f, "exist {{{}: {}}}", quoted(key), test),
            Condition::Join { left, right } => write!(f, "({}, {})", left, right),
        }
    }
}

/// Variable names print bare when they are identifiers and quoted otherwise,
/// so no name can forge the text of another condition.
fn variable_name(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');

    if is_identifier {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(quoted(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> Payload {
        Payload::fact(Fact::from_json_str(json).unwrap())
    }

    #[test]
    fn test_is_started() {
        assert!(Condition::IsStarted.is_met(&Payload::start(), None));
        assert!(!Condition::IsStarted.is_met(&payload("{}"), None));
        assert!(!Condition::IsEmpty.is_met(&Payload::start(), None));
    }

    #[test]
    fn test_is_empty_and_not_empty() {
        assert!(Condition::IsEmpty.is_met(&payload("{}"), None));
        assert!(!Condition::IsEmpty.is_met(&payload(r#"{"a": 1}"#), None));
        assert!(Condition::NotEmpty.is_met(&payload(r#"{"a": 1}"#), None));
        assert!(!Condition::NotEmpty.is_met(&payload("{}"), None));
    }

    #[test]
    fn test_has_key() {
        let condition = Condition::has_key("k1");
        assert!(condition.is_met(&payload(r#"{"k1": "v1"}"#), None));
        assert!(condition.is_met(&payload(r#"{"k1": [1, 2]}"#), None));
        assert!(!condition.is_met(&payload(r#"{"k2": "v1"}"#), None));
    }

    #[test]
    fn test_has_value_keeps_domains_apart() {
        let condition = Condition::has_value("k3", true);
        assert!(condition.is_met(&payload(r#"{"k3": true}"#), None));
        assert!(!condition.is_met(&payload(r#"{"k3": 1}"#), None));

        let condition = Condition::has_value("k3", 5);
        assert!(condition.is_met(&payload(r#"{"k3": 5}"#), None));
        assert!(!condition.is_met(&payload(r#"{"k3": 5.0}"#), None));

        let condition = Condition::has_value("k3", -0.123);
        assert!(condition.is_met(&payload(r#"{"k3": -0.123}"#), None));
    }

    #[test]
    fn test_has_value_array() {
        let condition = Condition::has_value("tags", vec!["a", "b"]);
        assert!(condition.is_met(&payload(r#"{"tags": ["a", "b"]}"#), None));
        assert!(!condition.is_met(&payload(r#"{"tags": ["b", "a"]}"#), None));
    }

    #[test]
    fn test_has_type() {
        let condition = Condition::has_type("n", ValueType::Int);
        assert!(condition.is_met(&payload(r#"{"n": 3}"#), None));
        assert!(!condition.is_met(&payload(r#"{"n": 3.5}"#), None));
        assert!(!condition.is_met(&payload(r#"{"m": 3}"#), None));
    }

    #[test]
    fn test_quantifiers() {
        let all_ints = Condition::for_all("xs", ElementTest::OfType(ValueType::Int));
        assert!(all_ints.is_met(&payload(r#"{"xs": [1, 2, 3]}"#), None));
        assert!(all_ints.is_met(&payload(r#"{"xs": []}"#), None));
        assert!(!all_ints.is_met(&payload(r#"{"xs": [1, "2"]}"#), None));
        assert!(!all_ints.is_met(&payload(r#"{"xs": 1}"#), None));

        let has_five = Condition::exists("xs", ElementTest::Equals(Value::from(5)));
        assert!(has_five.is_met(&payload(r#"{"xs": [1, 5]}"#), None));
        assert!(!has_five.is_met(&payload(r#"{"xs": []}"#), None));
    }

    #[test]
    fn test_all_and_not() {
        let condition = Condition::all([Condition::has_key("a"), Condition::not(Condition::has_key("b"))]);
        assert!(condition.is_met(&payload(r#"{"a": 1}"#), None));
        assert!(!condition.is_met(&payload(r#"{"a": 1, "b": 2}"#), None));
    }

    #[test]
    fn test_join_condition() {
        let condition = Condition::join(Condition::has_value("k1", "v1"), Condition::has_value("k2", "v1"));
        let left = payload(r#"{"k1": "v1"}"#);
        let right = payload(r#"{"k2": "v1"}"#);

        assert!(condition.is_met(&left, Some(&right)));
        assert!(!condition.is_met(&right, Some(&left)));
        assert!(!condition.is_met(&left, None));
    }

    #[test]
    fn test_single_condition_on_join_payload() {
        let a = payload(r#"{"k1": "v1"}"#);
        let b = payload(r#"{"k2": "v1"}"#);
        let joined = Payload::join(&a, &b).unwrap();

        assert!(Condition::has_key("k2").is_met(&joined, None));
        assert!(!Condition::has_key("k3").is_met(&joined, None));
    }

    #[test]
    fn test_negation_on_join_payload_covers_every_fact() {
        let with_x = payload(r#"{"x": 1}"#);
        let without_x = payload(r#"{"y": 1}"#);
        let joined = Payload::join(&with_x, &without_x).unwrap();

        assert!(!Condition::not(Condition::has_key("x")).is_met(&joined, None));
        assert!(Condition::not(Condition::has_key("z")).is_met(&joined, None));
    }

    #[test]
    fn test_pair_captures_merge_both_sides() {
        let condition = Condition::join(Condition::capture("v", "a"), Condition::capture("w", "b"));
        let bindings = condition
            .captures_pair(&payload(r#"{"a": 1}"#), &payload(r#"{"b": 2}"#))
            .unwrap();
        assert_eq!(bindings.get("v"), Some(&Binding::Value(Value::Int(1))));
        assert_eq!(bindings.get("w"), Some(&Binding::Value(Value::Int(2))));

        let same = Condition::join(Condition::capture("v", "a"), Condition::capture("v", "b"));
        assert!(same
            .captures_pair(&payload(r#"{"a": 1}"#), &payload(r#"{"b": 1}"#))
            .is_some());
        assert!(same
            .captures_pair(&payload(r#"{"a": 1}"#), &payload(r#"{"b": 2}"#))
            .is_none());
    }

    #[test]
    fn test_captures() {
        let condition = Condition::capture("v", "key");
        let p = payload(r#"{"key": 7}"#);

        assert!(condition.is_met(&p, None));
        let bindings = condition.captures(&p).unwrap();
        assert_eq!(bindings.get("v"), Some(&Binding::Value(Value::Int(7))));
    }

    #[test]
    fn test_capture_with_test() {
        let condition = Condition::capture_where("v", "key", ElementTest::OfType(ValueType::Int));
        assert!(condition.is_met(&payload(r#"{"key": 7}"#), None));
        assert!(!condition.is_met(&payload(r#"{"key": "7"}"#), None));
    }

    #[test]
    fn test_bind_fact_captures_whole_fact() {
        let condition = Condition::bind_fact("a", Condition::NotEmpty);
        let p = payload(r#"{"k": 1}"#);

        let bindings = condition.captures(&p).unwrap();
        match bindings.get("a") {
            Some(Binding::Fact(fact)) => assert_eq!(fact.get("k"), Some(&Value::Int(1))),
            other => panic!("expected a fact binding, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_variable_requires_equal_values() {
        let condition = Condition::all([Condition::capture("v", "a"), Condition::capture("v", "b")]);

        assert!(condition.captures(&payload(r#"{"a": 1, "b": 1}"#)).is_some());
        assert!(condition.captures(&payload(r#"{"a": 1, "b": 2}"#)).is_none());
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(Condition::IsStarted.to_string(), "None");
        assert_eq!(Condition::IsEmpty.to_string(), "{}");
        assert_eq!(Condition::NotEmpty.to_string(), "{...}");
        assert_eq!(Condition::has_key("key").to_string(), r#"{"key": _}"#);
        assert_eq!(Condition::has_value("key", 5).to_string(), r#"{"key": 5}"#);
        assert_eq!(Condition::has_value("key", 5.0).to_string(), r#"{"key": 5.0}"#);
        assert_eq!(Condition::has_value("key", true).to_string(), r#"{"key": true}"#);
        assert_eq!(Condition::has_value("k1", "v1").to_string(), r#"{"k1": "v1"}"#);
        assert_eq!(Condition::has_type("key", ValueType::Int).to_string(), r#"{"key": int}"#);
        assert_eq!(Condition::capture("v", "key").to_string(), r#"{$v = "key": _}"#);
        assert_eq!(
            Condition::bind_fact("a", Condition::NotEmpty).to_string(),
            "$a = {...}"
        );
        assert_eq!(
            Condition::join(Condition::has_value("k1", "v1"), Condition::has_value("k2", "v1")).to_string(),
            r#"({"k1": "v1"}, {"k2": "v1"})"#
        );
    }

    #[test]
    fn test_canonical_forms_are_unique() {
        use std::collections::HashSet;

        let conditions = [
            Condition::has_value("k3", 5),
            Condition::has_value("k3", 5.0),
            Condition::has_value("k3", true),
            Condition::has_value("k3", "5"),
            Condition::has_key("k3"),
            Condition::capture("k3", "k3"),
        ];
        let forms: HashSet<_> = conditions.iter().map(|c| c.to_string()).collect();

        assert_eq!(forms.len(), conditions.len());
    }

    #[test]
    fn test_odd_variable_names_are_quoted() {
        assert_eq!(Condition::capture("v w", "k").to_string(), r#"{$"v w" = "k": _}"#);
        assert_eq!(Condition::capture("_v1", "k").to_string(), r#"{$_v1 = "k": _}"#);

        let nested = Condition::bind_fact("a", Condition::bind_fact("b", Condition::NotEmpty));
        let forged = Condition::bind_fact("a = $b", Condition::NotEmpty);
        assert_eq!(nested.to_string(), "$a = $b = {...}");
        assert_ne!(nested.to_string(), forged.to_string());
    }
}
