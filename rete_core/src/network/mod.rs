//! Network - the discrimination network of root, alpha, beta and leaf nodes.
//!
//! Nodes live in an arena owned by the [`Network`] and are addressed by
//! [`NodeId`]. Every node is interned: building a node whose kind, condition
//! and parents match an existing node returns the existing one, so rules
//! that share a sub-pattern share its filter work and its memory.
//!
//! Propagation works as follows:
//! 1. **Root**: wraps the fact as a payload and drops it if already seen
//! 2. **Alpha**: tests its condition, adds captured variables, remembers new payloads
//! 3. **Beta**: joins the payload against the current memory of the opposite parent
//! 4. **Leaf**: records an activation for every new complete match
//!
//! Notifications go through a FIFO work queue rather than recursion. A node
//! always stores a payload before its children are queued, so whichever side
//! of a join is processed last sees the other side, and memory deduplication
//! absorbs the pairs both sides find.

mod config;
mod error;
mod node;
mod registry;
mod stats;

pub use config::*;
pub use error::*;
pub use node::*;
pub use registry::*;
pub use stats::*;

use fact_model::{Condition, Fact, Payload};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

use crate::session::Activation;

/// A queued delivery of a payload to a node.
#[derive(Debug, Clone)]
struct Notification {
    target: NodeId,
    payload: Payload,
    sender: Option<NodeId>,
}

/// The discrimination network.
#[derive(Debug)]
pub struct Network {
    id: NetworkId,
    nodes: Vec<Node>,
    registry: Registry,
    agenda: Vec<Activation>,
    total_activations: u64,
    config: NetworkConfig,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Create a network holding only its root node.
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        let id = NetworkId::new();
        let mut registry = Registry::new();
        registry.insert(NodeSignature::Root, 0);

        debug!(network = %id, "Created network");

        Self {
            id,
            nodes: vec![Node::new(NodeKind::Root)],
            registry,
            agenda: Vec::new(),
            total_activations: 0,
            config,
        }
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The root node every fact enters through.
    pub fn root(&self) -> NodeId {
        self.id_at(0)
    }

    /// Build (or reuse) an alpha node testing `condition` below `parent`.
    ///
    /// The parent must be the root or another alpha node.
    pub fn alpha(&mut self, condition: Condition, parent: NodeId) -> Result<NodeId, NetworkError> {
        if condition.is_join() {
            return Err(NetworkError::MisplacedCondition {
                condition: condition.to_string(),
                node: "alpha",
            });
        }
        self.expect_parent("alpha", parent, "single", feeds_alpha)?;

        let signature = NodeSignature::alpha(&condition, parent.index);
        if let Some(existing) = self.registry.get(&signature) {
            trace!(node = existing, "Reusing alpha node for {}", condition);
            return Ok(self.id_at(existing));
        }

        let id = self.create_node(signature, NodeKind::Alpha { condition, parent });
        self.prime(id)?;
        Ok(id)
    }

    /// Build (or reuse) a beta node joining `left` and `right` on `condition`.
    ///
    /// The left parent is an alpha or beta node (beta when chaining more than
    /// two conditions); the right parent is an alpha node. Both may be the
    /// same alpha node to join a fact set with itself.
    pub fn beta(
        &mut self,
        condition: Condition,
        left: NodeId,
        right: NodeId,
    ) -> Result<NodeId, NetworkError> {
        self.expect_parent("beta", left, "left", feeds_join_left)?;
        self.expect_parent("beta", right, "right", feeds_join_right)?;

        let signature = NodeSignature::beta(&condition, left.index, right.index);
        if let Some(existing) = self.registry.get(&signature) {
            trace!(node = existing, "Reusing beta node for {}", condition);
            return Ok(self.id_at(existing));
        }

        let id = self.create_node(signature, NodeKind::Beta { condition, left, right });
        self.prime(id)?;
        Ok(id)
    }

    /// Build (or reuse) the leaf node of `rule` below `parent`.
    ///
    /// `salience` orders activations when they are drained; higher first.
    pub fn leaf(
        &mut self,
        parent: NodeId,
        rule: impl Into<String>,
        salience: i32,
    ) -> Result<NodeId, NetworkError> {
        let rule = rule.into();
        self.expect_parent("leaf", parent, "single", feeds_leaf)?;

        let signature = NodeSignature::leaf(parent.index, &rule, salience);
        if let Some(existing) = self.registry.get(&signature) {
            return Ok(self.id_at(existing));
        }

        let id = self.create_node(signature, NodeKind::Leaf { parent, rule, salience });
        self.prime(id)?;
        Ok(id)
    }

    /// Assert a fact through the root.
    ///
    /// Returns once propagation has settled, with the number of new activations.
    pub fn assert(&mut self, fact: Fact) -> Result<usize, NetworkError> {
        let root = self.root();
        self.notify(root, Payload::fact(fact), None)
    }

    /// Assert the start sentinel through the root.
    pub fn start(&mut self) -> Result<usize, NetworkError> {
        let root = self.root();
        self.notify(root, Payload::start(), None)
    }

    /// Deliver `payload` to `target` as if sent by `sender`, then drain the
    /// propagation it causes.
    ///
    /// Beta nodes require `sender` to be one of their parents; anything else
    /// is reported as [`NetworkError::UnknownSource`] and stops propagation.
    pub fn notify(
        &mut self,
        target: NodeId,
        payload: Payload,
        sender: Option<NodeId>,
    ) -> Result<usize, NetworkError> {
        self.run(vec![Notification {
            target,
            payload,
            sender,
        }])
    }

    /// Check that every node has parents of the right kind and is registered
    /// as a child of each of them.
    pub fn validate(&self) -> Result<(), NetworkError> {
        for (index, node) in self.nodes.iter().enumerate() {
            let id = self.id_at(index);

            match &node.kind {
                NodeKind::Root => {}
                NodeKind::Alpha { parent, .. } => self.expect_parent("alpha", *parent, "single", feeds_alpha)?,
                NodeKind::Beta { left, right, .. } => {
                    self.expect_parent("beta", *left, "left", feeds_join_left)?;
                    self.expect_parent("beta", *right, "right", feeds_join_right)?;
                }
                NodeKind::Leaf { parent, .. } => self.expect_parent("leaf", *parent, "single", feeds_leaf)?,
            }

            for parent in node.kind.parents() {
                if !self.nodes[parent.index].children.contains(&id) {
                    return Err(NetworkError::BrokenWiring { node: id, parent });
                }
            }
        }

        Ok(())
    }

    /// Look up the node registered for a signature.
    pub fn find(&self, signature: &NodeSignature) -> Option<NodeId> {
        self.registry.get(signature).map(|index| self.id_at(index))
    }

    /// Look up the alpha node testing `condition` below `parent`, if built.
    pub fn find_alpha(&self, condition: &Condition, parent: NodeId) -> Option<NodeId> {
        if parent.network != self.id {
            return None;
        }
        self.find(&NodeSignature::alpha(condition, parent.index))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, NetworkError> {
        let index = self.index_of(id)?;
        Ok(&self.nodes[index])
    }

    /// The payloads a node has remembered, in discovery order.
    pub fn memory(&self, id: NodeId) -> Result<&[Payload], NetworkError> {
        Ok(self.node(id)?.memory.payloads())
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], NetworkError> {
        Ok(&self.node(id)?.children)
    }

    /// Iterate over all nodes in build order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (self.id_at(index), node))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of interned signatures. Equals the node count.
    pub fn registry_len(&self) -> usize {
        self.registry.len()
    }

    /// Activations produced and not yet drained, in discovery order.
    pub fn pending_activations(&self) -> &[Activation] {
        &self.agenda
    }

    /// Take all pending activations in discovery order.
    pub fn take_activations(&mut self) -> Vec<Activation> {
        std::mem::take(&mut self.agenda)
    }

    /// Get network statistics.
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            total_nodes: self.nodes.len(),
            total_activations: self.total_activations,
            pending_activations: self.agenda.len(),
            ..NetworkStats::default()
        };

        for node in &self.nodes {
            match node.kind {
                NodeKind::Root => {}
                NodeKind::Alpha { .. } => stats.alpha_nodes += 1,
                NodeKind::Beta { .. } => stats.beta_nodes += 1,
                NodeKind::Leaf { .. } => stats.leaf_nodes += 1,
            }
            stats.remembered_payloads += node.memory.len();
            stats.largest_memory = stats.largest_memory.max(node.memory.len());
        }

        stats
    }

    fn id_at(&self, index: usize) -> NodeId {
        NodeId {
            network: self.id,
            index,
        }
    }

    fn index_of(&self, id: NodeId) -> Result<usize, NetworkError> {
        if id.network != self.id || id.index >= self.nodes.len() {
            return Err(NetworkError::UnknownNode(id));
        }
        Ok(id.index)
    }

    fn expect_parent(
        &self,
        child: &'static str,
        parent: NodeId,
        role: &'static str,
        allowed: fn(&NodeKind) -> bool,
    ) -> Result<(), NetworkError> {
        let node = self.node(parent)?;
        if allowed(&node.kind) {
            Ok(())
        } else {
            Err(NetworkError::InvalidParent {
                child,
                parent: node.kind.name(),
                id: parent,
                role,
            })
        }
    }

    fn create_node(&mut self, signature: NodeSignature, kind: NodeKind) -> NodeId {
        let id = self.id_at(self.nodes.len());

        for parent in kind.parents() {
            self.nodes[parent.index].add_child(id);
        }

        match &kind {
            NodeKind::Leaf { rule, parent, .. } => {
                debug!(node = %id, parent = %parent, "Created leaf node for rule '{}'", rule)
            }
            _ => {
                let condition = kind.condition().map(ToString::to_string).unwrap_or_default();
                debug!(node = %id, "Created {} node {}", kind.name(), condition);
            }
        }

        self.nodes.push(Node::new(kind));
        self.registry.insert(signature, id.index);
        id
    }

    /// Replay parent memory into a freshly built node.
    fn prime(&mut self, id: NodeId) -> Result<(), NetworkError> {
        if !self.config.prime_new_nodes {
            return Ok(());
        }

        // A beta only needs its left memory replayed: each left payload is
        // joined against the whole right memory.
        let source = match &self.nodes[id.index].kind {
            NodeKind::Root => return Ok(()),
            NodeKind::Alpha { parent, .. } | NodeKind::Leaf { parent, .. } => *parent,
            NodeKind::Beta { left, .. } => *left,
        };

        let seeds: Vec<Notification> = self.nodes[source.index]
            .memory
            .payloads()
            .iter()
            .map(|payload| Notification {
                target: id,
                payload: payload.clone(),
                sender: Some(source),
            })
            .collect();

        if seeds.is_empty() {
            return Ok(());
        }

        debug!(node = %id, seeds = seeds.len(), "Priming new node from parent memory");
        self.run(seeds).map(|_| ())
    }

    fn run(&mut self, seeds: Vec<Notification>) -> Result<usize, NetworkError> {
        let before = self.total_activations;
        let mut queue: VecDeque<Notification> = seeds.into();

        while let Some(notification) = queue.pop_front() {
            self.step(notification, &mut queue)?;
        }

        Ok((self.total_activations - before) as usize)
    }

    fn step(
        &mut self,
        notification: Notification,
        queue: &mut VecDeque<Notification>,
    ) -> Result<(), NetworkError> {
        let Notification {
            target,
            payload,
            sender,
        } = notification;
        let index = self.index_of(target)?;

        trace!(node = %target, sender = ?sender, "Notify with {}", payload);

        let accepted = match &self.nodes[index].kind {
            NodeKind::Root | NodeKind::Leaf { .. } => vec![payload],
            NodeKind::Alpha { condition, .. } => filter(condition, payload).into_iter().collect(),
            NodeKind::Beta {
                condition,
                left,
                right,
            } => self.join(target, condition, *left, *right, &payload, sender)?,
        };

        for payload in accepted {
            if !self.remember(index, payload.clone()) {
                continue;
            }

            let node = &self.nodes[index];
            match &node.kind {
                NodeKind::Leaf { rule, salience, .. } => {
                    self.total_activations += 1;
                    debug!(rule = %rule, "Rule matched {}", payload);
                    self.agenda.push(Activation {
                        rule: rule.clone(),
                        salience: *salience,
                        payload,
                        leaf: target,
                        sequence: self.total_activations,
                    });
                }
                _ => {
                    for child in &node.children {
                        queue.push_back(Notification {
                            target: *child,
                            payload: payload.clone(),
                            sender: Some(target),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Join a payload from one side against the current memory of the other.
    fn join(
        &self,
        node: NodeId,
        condition: &Condition,
        left: NodeId,
        right: NodeId,
        payload: &Payload,
        sender: Option<NodeId>,
    ) -> Result<Vec<Payload>, NetworkError> {
        let from_left = sender == Some(left);
        let from_right = sender == Some(right);
        if !from_left && !from_right {
            return Err(NetworkError::UnknownSource { node, sender });
        }

        let mut joined = Vec::new();
        let mut attempt = |l: &Payload, r: &Payload| {
            if condition.is_met(l, Some(r)) {
                if let Some(result) = combine(condition, l, r) {
                    joined.push(result);
                }
            }
        };

        if from_left {
            for r in self.nodes[right.index].memory.payloads() {
                attempt(payload, r);
            }
        }
        if from_right {
            for l in self.nodes[left.index].memory.payloads() {
                attempt(l, payload);
            }
        }

        Ok(joined)
    }

    fn remember(&mut self, index: usize, payload: Payload) -> bool {
        let threshold = self.config.memory_warning_threshold;
        let node = &mut self.nodes[index];

        if !node.memory.insert(payload) {
            return false;
        }

        if let Some(limit) = threshold {
            if !node.warned && node.memory.len() >= limit {
                node.warned = true;
                warn!(
                    node = index,
                    kind = node.kind.name(),
                    size = node.memory.len(),
                    "Node memory reached the warning threshold; memories are never pruned"
                );
            }
        }

        true
    }
}

/// Alpha test: the condition holds and its captures agree with the payload's bindings.
fn filter(condition: &Condition, payload: Payload) -> Option<Payload> {
    if !condition.is_met(&payload, None) {
        return None;
    }
    let captures = condition.captures(&payload)?;
    let bindings = payload.bindings.merge(&captures)?;
    Some(payload.with_bindings(bindings))
}

/// Beta result: both sides plus the join condition's own captures, merged.
fn combine(condition: &Condition, left: &Payload, right: &Payload) -> Option<Payload> {
    let joined = Payload::join(left, right)?;
    let captures = condition.captures_pair(left, right)?;
    let bindings = joined.bindings.merge(&captures)?;
    Some(joined.with_bindings(bindings))
}

fn feeds_alpha(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Root | NodeKind::Alpha { .. })
}

fn feeds_join_left(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Alpha { .. } | NodeKind::Beta { .. })
}

fn feeds_join_right(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Alpha { .. })
}

fn feeds_leaf(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Alpha { .. } | NodeKind::Beta { .. })
}
