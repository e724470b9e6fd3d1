//! Errors raised while building or driving a network.

use fact_model::FactError;
use thiserror::Error;

use super::NodeId;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("node {0} does not belong to this network")]
    UnknownNode(NodeId),

    #[error("a {child} node cannot have the {parent} node {id} as its {role} parent")]
    InvalidParent {
        child: &'static str,
        parent: &'static str,
        id: NodeId,
        role: &'static str,
    },

    #[error("condition {condition} cannot be tested by a {node} node")]
    MisplacedCondition { condition: String, node: &'static str },

    /// A beta node was notified by a node that is neither of its parents.
    /// This is a wiring bug, never a data condition.
    #[error("beta node {node} was notified by {sender:?}, which is neither of its parents")]
    UnknownSource { node: NodeId, sender: Option<NodeId> },

    #[error("node {node} is missing from the children of its parent {parent}")]
    BrokenWiring { node: NodeId, parent: NodeId },

    #[error(transparent)]
    Fact(#[from] FactError),

    #[error("invalid network configuration: {0}")]
    Config(#[from] toml::de::Error),
}
