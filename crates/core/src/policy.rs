//! Access policy - which identities may run which operations
//!
//! Operations are named by the contract entry points. The default
//! [`RolePolicy`] leaves every operation open except a configured set that is
//! reserved for the admin identity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::config::UtilityConfig;
use crate::error::{ContractError, ContractResult};

/// Contract entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
pub enum Operation {
    InitLedger,
    CreateTransaction,
    ProcessTransaction,
    PerformComplianceCheck,
    ReadTransaction,
    TransactionExists,
    GetAllTransactions,
    GetTransactionHistory,
    VerifyTransactionChain,
    GetAuditTrail,
    RecordAuditEvent,
    SubmitLoanDocument,
    GetDocument,
    GetLoanDocuments,
    VerifyDocumentHash,
    ReviewDocument,
    #[strum(serialize = "SubmitKYCFormC")]
    #[serde(rename = "SubmitKYCFormC")]
    SubmitKycFormC,
    #[strum(serialize = "ApproveKYC")]
    #[serde(rename = "ApproveKYC")]
    ApproveKyc,
    #[strum(serialize = "GetKYCReference")]
    #[serde(rename = "GetKYCReference")]
    GetKycReference,
    #[strum(serialize = "ReadKYCFormC")]
    #[serde(rename = "ReadKYCFormC")]
    ReadKycFormC,
    #[strum(serialize = "VerifyKYCIntegrity")]
    #[serde(rename = "VerifyKYCIntegrity")]
    VerifyKycIntegrity,
}

/// Maps an invoking identity and an operation to allow / deny
pub trait AccessPolicy: Send + Sync {
    fn is_allowed(&self, identity: &str, operation: Operation) -> bool;

    /// Fail with `Unauthorized` when the identity may not run the operation
    fn authorize(&self, identity: &str, operation: Operation) -> ContractResult<()> {
        if self.is_allowed(identity, operation) {
            Ok(())
        } else {
            Err(ContractError::unauthorized(format!(
                "{} may not invoke {}",
                identity, operation
            )))
        }
    }
}

/// Single privileged role guarding a set of operations
#[derive(Debug, Clone)]
pub struct RolePolicy {
    admin_identity: String,
    restricted: HashSet<Operation>,
}

impl RolePolicy {
    pub fn new(
        admin_identity: impl Into<String>,
        restricted: impl IntoIterator<Item = Operation>,
    ) -> Self {
        Self {
            admin_identity: admin_identity.into(),
            restricted: restricted.into_iter().collect(),
        }
    }

    pub fn from_config(config: &UtilityConfig) -> Self {
        Self::new(
            config.admin_msp.clone(),
            config.restricted_operations.iter().copied(),
        )
    }

    pub fn is_restricted(&self, operation: Operation) -> bool {
        self.restricted.contains(&operation)
    }
}

impl AccessPolicy for RolePolicy {
    fn is_allowed(&self, identity: &str, operation: Operation) -> bool {
        !self.is_restricted(operation) || identity == self.admin_identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_guards_kyc() {
        let policy = RolePolicy::from_config(&UtilityConfig::default());

        assert!(policy.is_allowed("AdminMSP", Operation::SubmitKycFormC));
        assert!(!policy.is_allowed("CreditorMSP", Operation::SubmitKycFormC));
        assert!(!policy.is_allowed("CreditorMSP", Operation::ApproveKyc));
        assert!(policy.is_allowed("CreditorMSP", Operation::CreateTransaction));
        assert!(policy.is_allowed("CreditorMSP", Operation::GetKycReference));
    }

    #[test]
    fn test_authorize_reports_identity() {
        let policy = RolePolicy::new("AdminMSP", [Operation::ReviewDocument]);
        let err = policy.authorize("DebtorMSP", Operation::ReviewDocument).unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized(_)));
        assert!(err.to_string().contains("DebtorMSP"));
    }

    #[test]
    fn test_entry_point_names() {
        assert_eq!("SubmitKYCFormC".parse::<Operation>().unwrap(), Operation::SubmitKycFormC);
        assert_eq!(Operation::ApproveKyc.to_string(), "ApproveKYC");
        assert_eq!("InitLedger".parse::<Operation>().unwrap(), Operation::InitLedger);
        assert!("DeleteEverything".parse::<Operation>().is_err());
    }
}
