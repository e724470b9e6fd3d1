//! # Fact Model
//!
//! The data crate of jsonrete - facts, field values, conditions and the
//! partial-match payloads that flow through the discrimination network.
//! This crate contains no network logic; it is the vocabulary `rete_core`
//! is written in.

pub mod conditions;
pub mod facts;
pub mod payload;

pub use conditions::*;
pub use facts::*;
pub use payload::*;
