//! State accessor errors

use iu_core::ContractError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Key cannot be empty")]
    EmptyKey,

    #[error("MVCC read conflict on key {0}")]
    MvccConflict(String),

    #[error("Unknown private collection: {0}")]
    UnknownCollection(String),

    #[error("{identity} is not a member of collection {collection}")]
    AccessDenied { collection: String, identity: String },

    #[error("State lock poisoned")]
    Poisoned,

    #[error("Invalid journal file: {0}")]
    InvalidFile(String),
}

pub type StateResult<T> = Result<T, StateError>;

impl From<StateError> for ContractError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::AccessDenied { .. } => ContractError::Unauthorized(e.to_string()),
            other => ContractError::Storage(other.to_string()),
        }
    }
}
