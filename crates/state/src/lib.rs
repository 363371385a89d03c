//! Information Utility State - the ledger accessor the contract runs against
//!
//! The contract crates only ever see [`ChaincodeStub`]. This crate also ships
//! the in-memory [`Ledger`] that hands out one [`TxStub`] per invocation and
//! commits its write set atomically after MVCC read validation. With a data
//! directory the ledger journals every committed block to JSONL and replays
//! it on open.

pub mod error;
pub mod journal;
pub mod ledger;
pub mod selector;
pub mod stub;
pub mod tx;

pub use error::{StateError, StateResult};
pub use journal::{BlockRecord, Journal, PrivateBlockRecord};
pub use ledger::{CollectionConfig, CommitReceipt, Ledger};
pub use selector::Selector;
pub use stub::{ChaincodeEvent, ChaincodeStub, KeyModification, KeyValue, Transient};
pub use tx::TxStub;
