//! Utility configuration
//!
//! Role names and collection names are configuration, not literals in the
//! contract code. Every field has a default so partial JSON files work.

use serde::{Deserialize, Serialize};

use crate::policy::Operation;

/// Configuration for the contract crates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityConfig {
    /// Organizational identity allowed to run restricted operations
    #[serde(default = "default_admin_msp")]
    pub admin_msp: String,

    /// Private collection holding KYC Form-C payloads
    #[serde(default = "default_kyc_collection")]
    pub kyc_collection: String,

    /// Transient input field carrying the Form-C payload
    #[serde(default = "default_formc_transient_key")]
    pub formc_transient_key: String,

    /// Operations reserved for `admin_msp`
    #[serde(default = "default_restricted_operations")]
    pub restricted_operations: Vec<Operation>,
}

fn default_admin_msp() -> String {
    "AdminMSP".to_string()
}

fn default_kyc_collection() -> String {
    "formc_admin_only".to_string()
}

fn default_formc_transient_key() -> String {
    "formc".to_string()
}

fn default_restricted_operations() -> Vec<Operation> {
    vec![
        Operation::SubmitKycFormC,
        Operation::ApproveKyc,
        Operation::ReadKycFormC,
        Operation::VerifyKycIntegrity,
        Operation::ReviewDocument,
    ]
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            admin_msp: default_admin_msp(),
            kyc_collection: default_kyc_collection(),
            formc_transient_key: default_formc_transient_key(),
            restricted_operations: default_restricted_operations(),
        }
    }
}

impl UtilityConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Override the admin identity
    pub fn with_admin_msp(mut self, admin_msp: impl Into<String>) -> Self {
        self.admin_msp = admin_msp.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = UtilityConfig::default();

        assert_eq!(config.admin_msp, "AdminMSP");
        assert_eq!(config.kyc_collection, "formc_admin_only");
        assert_eq!(config.formc_transient_key, "formc");
        assert!(config.restricted_operations.contains(&Operation::SubmitKycFormC));
        assert!(!config.restricted_operations.contains(&Operation::CreateTransaction));
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{ "admin_msp": "RegulatorMSP" }"#;
        let config: UtilityConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.admin_msp, "RegulatorMSP");
        assert_eq!(config.kyc_collection, "formc_admin_only");
    }

    #[test]
    fn test_restricted_operations_by_entry_point_name() {
        let json = r#"{ "restricted_operations": ["ApproveKYC", "PerformComplianceCheck"] }"#;
        let config: UtilityConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.restricted_operations,
            vec![Operation::ApproveKyc, Operation::PerformComplianceCheck]
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "kyc_collection": "kyc_private" }}"#).unwrap();

        let config = UtilityConfig::from_file(file.path()).unwrap();
        assert_eq!(config.kyc_collection, "kyc_private");
        assert_eq!(config.admin_msp, "AdminMSP");
    }
}
