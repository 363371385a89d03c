//! The accessor interface consumed by the contract
//!
//! Mirrors the capabilities a chaincode shim exposes: versioned public state,
//! private collections, transient input, one event per invocation, and the
//! invoking identity. Reads only ever observe committed state.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StateResult;
use crate::selector::Selector;

/// Caller-supplied input that is never written to the committed record
pub type Transient = HashMap<String, Vec<u8>>;

/// One entry returned by a range scan or rich query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// One historical version of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
    /// Empty for deletions
    pub value: Vec<u8>,
}

/// Notification attached to a committed invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaincodeEvent {
    pub tx_id: String,
    pub name: String,
    #[serde(with = "crate::journal::hex_bytes")]
    pub payload: Vec<u8>,
}

/// Ledger accessor for a single invocation
#[async_trait]
pub trait ChaincodeStub: Send + Sync {
    /// Id of the invocation this stub belongs to
    fn tx_id(&self) -> &str;

    /// Proposal timestamp, identical on every endorser
    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Organizational membership of the invoking identity
    fn creator_msp_id(&self) -> StateResult<String>;

    fn get_transient(&self) -> StateResult<Transient>;

    /// Attach an event to the invocation; a later call replaces an earlier one
    fn set_event(&self, name: &str, payload: Vec<u8>) -> StateResult<()>;

    async fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>>;

    async fn put_state(&self, key: &str, value: Vec<u8>) -> StateResult<()>;

    async fn del_state(&self, key: &str) -> StateResult<()>;

    /// Keys in `[start, end)`; an empty `end` means unbounded
    async fn get_state_by_range(&self, start: &str, end: &str) -> StateResult<Vec<KeyValue>>;

    /// Rich query over JSON values; served from a possibly stale index
    async fn get_query_result(&self, selector: &Selector) -> StateResult<Vec<KeyValue>>;

    async fn get_history_for_key(&self, key: &str) -> StateResult<Vec<KeyModification>>;

    async fn get_private_data(&self, collection: &str, key: &str) -> StateResult<Option<Vec<u8>>>;

    async fn put_private_data(
        &self,
        collection: &str,
        key: &str,
        value: Vec<u8>,
    ) -> StateResult<()>;
}
