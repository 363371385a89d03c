//! Information Utility Core - record types shared by every contract crate
//!
//! # Key Types
//! - `Transaction`: a creditor/debtor money movement with its hash-chain link
//! - `Account`: seed balances written at genesis
//! - `AuditRecord`: append-only trail entry, one per mutating transaction operation
//! - `Document`: integrity hash and metadata of a loan document
//! - `KycReference`: public half of a KYC Form-C disclosure
//!
//! All records are stored as UTF-8 JSON with camelCase field names, see [`codec`].

pub mod account;
pub mod amount;
pub mod audit;
pub mod codec;
pub mod config;
pub mod currency;
pub mod digest;
pub mod document;
pub mod error;
pub mod kyc;
pub mod policy;
pub mod transaction;

pub use account::{Account, AccountStatus, AccountType};
pub use amount::{Amount, AmountError};
pub use audit::{AuditAction, AuditEvent, AuditRecord, ComplianceStatus};
pub use codec::{decode, encode, Entity};
pub use config::UtilityConfig;
pub use currency::{Currency, CurrencyError};
pub use digest::sha256_hex;
pub use document::{Document, DocumentStatus, DocumentVerification};
pub use error::{require_non_empty, ContractError, ContractResult};
pub use kyc::{KycIntegrity, KycReference, KycStatus};
pub use policy::{AccessPolicy, Operation, RolePolicy};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
