//! # RETE Core
//!
//! The discrimination network of jsonrete. Facts asserted through a
//! [`Session`] enter the network's root, are filtered by alpha nodes, joined
//! by beta nodes, and reach leaf nodes as [`Activation`]s once a rule's
//! pattern is fully matched.
//!
//! ## Core Components
//!
//! - **network**: the node arena, the interning registry and the propagation loop
//! - **session**: the runtime handle that asserts facts and hands out activations
//!
//! ## Design Philosophy
//!
//! - **Incremental**: each new fact is only compared against the memories it can join with
//! - **Memoized**: every node remembers what it has seen, so no match is computed twice
//! - **Shared**: identical nodes built by different rules are one node

pub mod network;
pub mod session;

pub use network::*;
pub use session::*;

pub use fact_model::*;
