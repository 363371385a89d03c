//! Information Utility RPC - contract dispatcher and CLI orchestrator
//!
//! This crate maps named entry points onto the contract crates, runs each
//! invocation as one atomic unit against the ledger, and provides the `iu`
//! binary.

pub mod commands;
pub mod context;
pub mod contract;

pub use context::{AppContext, Invocation, InvokeError};
pub use contract::Contract;
