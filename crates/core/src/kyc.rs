//! KYC Form-C public reference
//!
//! The form itself lives in a private collection; the public ledger only
//! carries its SHA-256 digest and the approval status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::codec::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    Submitted,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn from_decision(approved: bool) -> Self {
        if approved {
            KycStatus::Approved
        } else {
            KycStatus::Rejected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycReference {
    pub kyc_id: String,
    pub loan_id: String,
    pub party_id: String,
    pub hash: String,
    pub status: KycStatus,
    pub timestamp: DateTime<Utc>,
    pub remarks: String,
}

impl KycReference {
    pub fn key_for(kyc_id: &str) -> String {
        format!("KYC_{}", kyc_id)
    }
}

impl Entity for KycReference {
    const KIND: &'static str = "kyc";

    fn state_key(&self) -> String {
        Self::key_for(&self.kyc_id)
    }
}

/// Outcome of re-hashing the private form against the public reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycIntegrity {
    pub kyc_id: String,
    pub is_valid: bool,
    pub public_hash: String,
    pub private_hash: String,
}
