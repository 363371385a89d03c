//! Entity codec - JSON bytes in, records out
//!
//! Decoding is strict about required fields, which is what lets full scans
//! over a shared key space tell a Transaction apart from an AuditRecord or a
//! Document. Unknown fields are ignored and field order is irrelevant.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ContractResult;

/// A record stored under its own ledger key
pub trait Entity: Serialize + DeserializeOwned {
    /// Human-readable kind, used in error messages
    const KIND: &'static str;

    /// Ledger key this record is stored under
    fn state_key(&self) -> String;
}

/// Encode a record as UTF-8 JSON bytes
pub fn encode<T: Serialize>(value: &T) -> ContractResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a record from UTF-8 JSON bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ContractResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}
