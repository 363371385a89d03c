//! Hash chain utilities for transaction integrity
//!
//! Every transaction carries the hash of the previous transaction between the
//! same creditor and debtor, so each relationship forms its own chain.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::SecondsFormat;
use iu_core::Transaction;
use sha2::{Digest, Sha256};

/// Separator between hashed fields, so adjacent values cannot run together
const FIELD_SEPARATOR: [u8; 1] = [0x1f];

/// Calculate SHA256 hash of the identifying fields (excluding `hash`)
///
/// Status, `validatedBy` and `complianceChecked` change over the lifecycle
/// and are not covered.
pub fn calculate_transaction_hash(tx: &Transaction) -> String {
    let mut hasher = Sha256::new();

    let timestamp = tx.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let amount = tx.amount.to_string();
    let transaction_type = tx.transaction_type.to_string();

    for field in [
        tx.id.as_str(),
        tx.creditor_id.as_str(),
        tx.debtor_id.as_str(),
        amount.as_str(),
        tx.currency.code(),
        transaction_type.as_str(),
        tx.description.as_str(),
        timestamp.as_str(),
        tx.previous_hash.as_str(),
    ] {
        hasher.update(field.as_bytes());
        hasher.update(FIELD_SEPARATOR);
    }

    hex::encode(hasher.finalize())
}

/// Order in which transactions are tried when a link is ambiguous
fn chronological(a: &Transaction, b: &Transaction) -> Ordering {
    a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id))
}

/// Follow one relationship's chain from its root
///
/// The root has an empty `previous_hash` and every later link names its
/// predecessor's hash. Input order does not matter; timestamps only decide
/// which transaction is reported when the links are broken.
pub fn walk_chain(transactions: &[Transaction]) -> Result<Vec<&Transaction>, ChainError> {
    let mut remaining: Vec<&Transaction> = transactions.iter().collect();
    remaining.sort_by(|a, b| chronological(a, b));

    let mut chain = Vec::with_capacity(remaining.len());
    let mut prev_hash = String::new();

    while !remaining.is_empty() {
        let mut linked = remaining
            .iter()
            .enumerate()
            .filter(|(_, tx)| tx.previous_hash == prev_hash)
            .map(|(i, _)| i);

        let Some(next) = linked.next() else {
            let orphan = remaining[0];
            return Err(ChainError::BrokenLink {
                id: orphan.id.clone(),
                expected: prev_hash,
                actual: orphan.previous_hash.clone(),
            });
        };
        if let Some(other) = linked.next() {
            return Err(ChainError::Fork {
                id: remaining[other].id.clone(),
                previous_hash: prev_hash,
            });
        }

        let tx = remaining.remove(next);
        let calculated = calculate_transaction_hash(tx);
        if tx.hash != calculated {
            return Err(ChainError::InvalidHash {
                id: tx.id.clone(),
                expected: calculated,
                actual: tx.hash.clone(),
            });
        }

        prev_hash = tx.hash.clone();
        chain.push(tx);
    }

    Ok(chain)
}

/// Verify one relationship's chain
pub fn verify_chain(transactions: &[Transaction]) -> Result<(), ChainError> {
    walk_chain(transactions).map(|_| ())
}

/// The transaction no other transaction links to
///
/// On a damaged chain several transactions can qualify; the latest by
/// timestamp, then id, wins.
pub fn chain_tip(transactions: &[Transaction]) -> Option<&Transaction> {
    let referenced: HashSet<&str> = transactions
        .iter()
        .map(|tx| tx.previous_hash.as_str())
        .collect();

    transactions
        .iter()
        .filter(|tx| !referenced.contains(tx.hash.as_str()))
        .max_by(|a, b| chronological(a, b))
        .or_else(|| transactions.iter().max_by(|a, b| chronological(a, b)))
}

/// Errors in hash chain verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    BrokenLink {
        id: String,
        expected: String,
        actual: String,
    },
    InvalidHash {
        id: String,
        expected: String,
        actual: String,
    },
    Fork {
        id: String,
        previous_hash: String,
    },
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::BrokenLink {
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Broken link at {}: expected previousHash '{}', got '{}'",
                    id, expected, actual
                )
            }
            ChainError::InvalidHash {
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Invalid hash at {}: expected '{}', got '{}'",
                    id, expected, actual
                )
            }
            ChainError::Fork { id, previous_hash } => {
                write!(
                    f,
                    "Fork at {}: previousHash '{}' is linked more than once",
                    id, previous_hash
                )
            }
        }
    }
}

impl std::error::Error for ChainError {}
