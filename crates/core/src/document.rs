//! Loan document metadata
//!
//! Only metadata and the integrity hash are recorded, never the document
//! bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::codec::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Submitted,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub doc_id: String,
    pub loan_id: String,
    pub hash: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub mime: String,
    pub size: u64,
    pub owner_org: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: DocumentStatus,
    pub metadata: String,
}

impl Document {
    pub fn key_for(doc_id: &str) -> String {
        format!("DOC_{}", doc_id)
    }
}

impl Entity for Document {
    const KIND: &'static str = "document";

    fn state_key(&self) -> String {
        Self::key_for(&self.doc_id)
    }
}

/// Result of comparing a caller-supplied hash to the recorded one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVerification {
    pub doc_id: String,
    pub loan_id: String,
    pub is_valid: bool,
    pub stored_hash: String,
    pub provided_hash: String,
    pub verified_at: DateTime<Utc>,
}
