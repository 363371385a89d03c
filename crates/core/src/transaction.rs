//! Transaction - creditor/debtor money movement with compliance gating
//!
//! Lifecycle: PENDING → COMPLETED (after a passed compliance check) or
//! PENDING/any → FAILED (on a rejected compliance check).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::amount::Amount;
use crate::codec::Entity;
use crate::currency::Currency;

/// Direction of the money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Debit,
    Credit,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Created, awaiting compliance and processing
    Pending,
    /// Processed after a passed compliance check
    Completed,
    /// Compliance check rejected the transaction
    Failed,
}

/// A financial transaction recorded by the utility
///
/// `hash` covers the identifying fields and the creation timestamp;
/// `previous_hash` links to the last transaction of the same
/// creditor/debtor pair, forming a per-relationship chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub creditor_id: String,
    pub debtor_id: String,
    pub amount: Amount,
    pub currency: Currency,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub hash: String,
    pub previous_hash: String,
    pub validated_by: String,
    pub compliance_checked: bool,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    /// True when the transaction may move to COMPLETED
    pub fn is_processable(&self) -> bool {
        self.is_pending() && self.compliance_checked
    }
}

impl Entity for Transaction {
    const KIND: &'static str = "transaction";

    fn state_key(&self) -> String {
        self.id.clone()
    }
}
