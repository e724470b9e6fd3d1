//! Network statistics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of a network's size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub total_nodes: usize,
    pub alpha_nodes: usize,
    pub beta_nodes: usize,
    pub leaf_nodes: usize,
    /// Payloads held across all node memories.
    pub remembered_payloads: usize,
    /// Size of the largest single memory.
    pub largest_memory: usize,
    /// Activations produced since the network was built.
    pub total_activations: u64,
    /// Activations waiting to be drained.
    pub pending_activations: usize,
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Nodes: {} (α:{}, β:{}, leaf:{}), Payloads: {} (max {}), Activations: {} ({} pending)",
            self.total_nodes,
            self.alpha_nodes,
            self.beta_nodes,
            self.leaf_nodes,
            self.remembered_payloads,
            self.largest_memory,
            self.total_activations,
            self.pending_activations
        )
    }
}
