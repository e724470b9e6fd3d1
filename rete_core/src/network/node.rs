//! Node definitions - the vertices of the discrimination network.

use fact_model::{Condition, Payload};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub Uuid);

impl NetworkId {
    /// Create a new random network ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NetworkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a node. Only valid for the network that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub network: NetworkId,
    pub index: usize,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// What a node does and who feeds it.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Entry point for every asserted fact.
    Root,

    /// Single-input filter.
    Alpha { condition: Condition, parent: NodeId },

    /// Two-input join.
    Beta {
        condition: Condition,
        left: NodeId,
        right: NodeId,
    },

    /// Terminal node of one rule.
    Leaf {
        parent: NodeId,
        rule: String,
        salience: i32,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Alpha { .. } => "alpha",
            NodeKind::Beta { .. } => "beta",
            NodeKind::Leaf { .. } => "leaf",
        }
    }

    /// The nodes this one receives notifications from.
    pub fn parents(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Root => Vec::new(),
            NodeKind::Alpha { parent, .. } | NodeKind::Leaf { parent, .. } => vec![*parent],
            NodeKind::Beta { left, right, .. } if left == right => vec![*left],
            NodeKind::Beta { left, right, .. } => vec![*left, *right],
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match self {
            NodeKind::Alpha { condition, .. } | NodeKind::Beta { condition, .. } => Some(condition),
            _ => None,
        }
    }
}

/// The set of payloads a node has seen, in discovery order.
///
/// Only grows; inserting a payload that is already present is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    seen: HashSet<Payload>,
    order: Vec<Payload>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a payload. Returns `true` if it was not already present.
    pub fn insert(&mut self, payload: Payload) -> bool {
        if self.seen.contains(&payload) {
            return false;
        }
        self.seen.insert(payload.clone());
        self.order.push(payload);
        true
    }

    pub fn contains(&self, payload: &Payload) -> bool {
        self.seen.contains(payload)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn payloads(&self) -> &[Payload] {
        &self.order
    }
}

/// A vertex in the network arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub memory: Memory,
    pub children: Vec<NodeId>,
    /// Set once the memory-size warning has been logged for this node.
    pub(crate) warned: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            memory: Memory::new(),
            children: Vec::new(),
            warned: false,
        }
    }

    /// Add a child node, ignoring duplicates.
    pub fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }
}
