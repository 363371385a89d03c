//! Information Utility Ledger - transaction lifecycle and audit trail
//!
//! All transaction state changes go through this crate.
//!
//! # Modules
//! - `engine`: create, compliance-check, process and read transactions
//! - `hash`: per creditor/debtor hash chain
//! - `audit`: one audit record per mutating transaction operation
//! - `bootstrap`: genesis seed accounts

pub mod audit;
pub mod bootstrap;
pub mod engine;
pub mod hash;

pub use audit::{get_audit_trail, record_audit_event};
pub use bootstrap::init_ledger;
pub use engine::{
    create_transaction, get_all_transactions, get_transaction_history, perform_compliance_check,
    process_transaction, read_transaction, transaction_exists, verify_transaction_chain,
    ChainReport, HistoryEntry, TransactionRequest,
};
pub use hash::{calculate_transaction_hash, chain_tip, verify_chain, walk_chain, ChainError};
