//! Information Utility Documents - loan document registry
//!
//! Only metadata and the caller-computed digest live on the ledger; the file
//! itself stays off-chain.

pub mod registry;

pub use registry::{DocumentRegistry, DocumentSubmission};
