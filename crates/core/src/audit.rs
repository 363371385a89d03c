//! Audit trail records
//!
//! `AuditRecord` is written once per mutating transaction operation and never
//! updated. `AuditEvent` is the free-form mirror record written by
//! `RecordAuditEvent`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::codec::Entity;

/// Mutating transaction operations that leave an audit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateTransaction,
    ComplianceCheck,
    ProcessTransaction,
}

/// Compliance status snapshot carried by an audit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    PendingReview,
    Approved,
    Rejected,
}

impl ComplianceStatus {
    pub fn from_decision(approved: bool) -> Self {
        if approved {
            ComplianceStatus::Approved
        } else {
            ComplianceStatus::Rejected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    pub transaction_id: String,
    pub action: AuditAction,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub details: String,
    pub compliance_status: ComplianceStatus,
}

impl AuditRecord {
    /// Key prefix shared by every audit record of one transaction and action
    pub fn key_prefix(transaction_id: &str, action: AuditAction) -> String {
        format!("AUDIT_{}_{}", transaction_id, action)
    }
}

impl Entity for AuditRecord {
    const KIND: &'static str = "audit record";

    fn state_key(&self) -> String {
        self.id.clone()
    }
}

/// Minimal audit event mirrored from off-ledger systems
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub event_type: String,
    pub ref_id: String,
    pub hash: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn key_prefix(ref_id: &str) -> String {
        format!("AUDIT_EVT_{}", ref_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix_uses_action_tag() {
        assert_eq!(
            AuditRecord::key_prefix("T1", AuditAction::ComplianceCheck),
            "AUDIT_T1_COMPLIANCE_CHECK"
        );
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(
            serde_json::to_string(&AuditAction::ProcessTransaction).unwrap(),
            "\"PROCESS_TRANSACTION\""
        );
        assert_eq!(
            serde_json::to_string(&ComplianceStatus::PendingReview).unwrap(),
            "\"PENDING_REVIEW\""
        );
    }
}
