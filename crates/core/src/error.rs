//! Contract errors

use thiserror::Error;

use crate::amount::AmountError;
use crate::currency::CurrencyError;

/// Errors returned by every contract operation
///
/// None of these are retried internally; the invocation's write set is
/// discarded and the error is handed back to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("{kind} {id} does not exist")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ContractError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ContractError::Validation(msg.into())
    }

    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        ContractError::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ContractError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        ContractError::InvalidState(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ContractError::Unauthorized(msg.into())
    }

    /// Short machine-readable tag, used by the CLI exit output
    pub fn kind(&self) -> &'static str {
        match self {
            ContractError::Validation(_) => "ValidationError",
            ContractError::AlreadyExists { .. } => "AlreadyExists",
            ContractError::NotFound { .. } => "NotFound",
            ContractError::InvalidState(_) => "InvalidState",
            ContractError::Unauthorized(_) => "Unauthorized",
            ContractError::Serialization(_) => "SerializationError",
            ContractError::Storage(_) => "StorageError",
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        ContractError::Serialization(e.to_string())
    }
}

impl From<AmountError> for ContractError {
    fn from(e: AmountError) -> Self {
        ContractError::Validation(e.to_string())
    }
}

impl From<CurrencyError> for ContractError {
    fn from(e: CurrencyError) -> Self {
        ContractError::Validation(e.to_string())
    }
}

/// Result type for contract operations
pub type ContractResult<T> = Result<T, ContractError>;

/// Fail with a validation error when any named argument is empty
pub fn require_non_empty(args: &[(&str, &str)]) -> ContractResult<()> {
    let missing: Vec<&str> = args
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ContractError::Validation(format!(
            "{} required",
            missing.join(", ")
        )))
    }
}
