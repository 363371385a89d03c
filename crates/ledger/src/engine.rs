//! Transaction ledger engine
//!
//! Creation with per-pair hash chaining, compliance gating, processing, and
//! the read-side queries. Every mutating operation leaves one audit record.

use chrono::{DateTime, Utc};
use iu_core::{
    decode, encode, require_non_empty, Amount, AuditAction, ComplianceStatus, ContractError,
    ContractResult, Currency, Entity, Transaction, TransactionStatus, TransactionType,
};
use iu_state::{ChaincodeStub, Selector};
use serde::{Deserialize, Serialize};

use crate::audit;
use crate::hash::{calculate_transaction_hash, chain_tip, walk_chain};

/// Unparsed arguments of `CreateTransaction`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    pub id: String,
    pub creditor_id: String,
    pub debtor_id: String,
    pub amount: String,
    pub currency: String,
    pub transaction_type: String,
    pub description: String,
}

/// One historical version of a transaction key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
    /// `None` for deletions
    pub value: Option<Transaction>,
}

/// Result of verifying one creditor/debtor chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReport {
    pub creditor_id: String,
    pub debtor_id: String,
    pub length: usize,
    pub valid: bool,
    pub last_hash: String,
    pub error: Option<String>,
}

/// Record a new PENDING transaction chained to its pair's latest hash
pub async fn create_transaction(
    stub: &dyn ChaincodeStub,
    request: &TransactionRequest,
) -> ContractResult<Transaction> {
    require_non_empty(&[
        ("id", request.id.as_str()),
        ("creditorId", request.creditor_id.as_str()),
        ("debtorId", request.debtor_id.as_str()),
    ])?;
    let amount: Amount = request.amount.parse()?;
    let currency: Currency = request.currency.parse()?;
    let transaction_type: TransactionType = request.transaction_type.parse().map_err(|_| {
        ContractError::validation(format!(
            "Unknown transaction type: {}",
            request.transaction_type
        ))
    })?;

    if transaction_exists(stub, &request.id).await? {
        return Err(ContractError::already_exists(Transaction::KIND, &request.id));
    }

    let previous_hash = previous_hash_for(stub, &request.creditor_id, &request.debtor_id).await;

    let mut tx = Transaction {
        id: request.id.clone(),
        creditor_id: request.creditor_id.clone(),
        debtor_id: request.debtor_id.clone(),
        amount,
        currency,
        transaction_type,
        status: TransactionStatus::Pending,
        timestamp: stub.tx_timestamp(),
        description: request.description.clone(),
        hash: String::new(),
        previous_hash,
        validated_by: String::new(),
        compliance_checked: false,
    };
    tx.hash = calculate_transaction_hash(&tx);

    stub.put_state(&tx.state_key(), encode(&tx)?).await?;

    audit::record(
        stub,
        &tx.id,
        AuditAction::CreateTransaction,
        ComplianceStatus::PendingReview,
        format!(
            "Transaction created: {} to {}, Amount: {} {}",
            tx.creditor_id, tx.debtor_id, tx.amount, tx.currency
        ),
    )
    .await?;

    tracing::info!(
        transaction_id = %tx.id,
        creditor = %tx.creditor_id,
        debtor = %tx.debtor_id,
        amount = %tx.amount,
        "Transaction created"
    );
    Ok(tx)
}

/// Record a compliance decision; a rejection forces FAILED
pub async fn perform_compliance_check(
    stub: &dyn ChaincodeStub,
    id: &str,
    approved: bool,
) -> ContractResult<Transaction> {
    let mut tx = read_transaction(stub, id).await?;

    tx.compliance_checked = true;
    if !approved {
        tx.status = TransactionStatus::Failed;
    }

    stub.put_state(&tx.state_key(), encode(&tx)?).await?;

    let status = ComplianceStatus::from_decision(approved);
    audit::record(
        stub,
        id,
        AuditAction::ComplianceCheck,
        status,
        format!("Compliance check result: {}", status),
    )
    .await?;

    tracing::info!(
        transaction_id = %id,
        approved,
        status = %tx.status,
        "Compliance check recorded"
    );
    Ok(tx)
}

/// Move a compliance-checked PENDING transaction to COMPLETED
pub async fn process_transaction(
    stub: &dyn ChaincodeStub,
    id: &str,
) -> ContractResult<Transaction> {
    let mut tx = read_transaction(stub, id).await?;

    if !tx.is_processable() {
        let reason = if tx.is_pending() {
            "has not passed compliance check"
        } else {
            "is not in PENDING status"
        };
        return Err(ContractError::invalid_state(format!(
            "transaction {} {}",
            id, reason
        )));
    }

    let actor = stub.creator_msp_id()?;
    tx.status = TransactionStatus::Completed;
    tx.validated_by = actor.clone();

    stub.put_state(&tx.state_key(), encode(&tx)?).await?;

    audit::record(
        stub,
        id,
        AuditAction::ProcessTransaction,
        ComplianceStatus::Approved,
        format!("Transaction processed and completed by {}", actor),
    )
    .await?;

    tracing::info!(transaction_id = %id, validated_by = %actor, "Transaction processed");
    Ok(tx)
}

pub async fn read_transaction(stub: &dyn ChaincodeStub, id: &str) -> ContractResult<Transaction> {
    require_non_empty(&[("id", id)])?;
    let bytes = stub
        .get_state(id)
        .await?
        .ok_or_else(|| ContractError::not_found(Transaction::KIND, id))?;
    decode(&bytes)
}

pub async fn transaction_exists(stub: &dyn ChaincodeStub, id: &str) -> ContractResult<bool> {
    require_non_empty(&[("id", id)])?;
    Ok(stub.get_state(id).await?.is_some())
}

/// Every value in the key space that decodes as a transaction
pub async fn get_all_transactions(stub: &dyn ChaincodeStub) -> ContractResult<Vec<Transaction>> {
    let entries = stub.get_state_by_range("", "").await?;
    let total = entries.len();

    let transactions: Vec<Transaction> = entries
        .iter()
        .filter_map(|kv| decode(&kv.value).ok())
        .collect();

    tracing::debug!(scanned = total, matched = transactions.len(), "Full transaction scan");
    Ok(transactions)
}

pub async fn get_transaction_history(
    stub: &dyn ChaincodeStub,
    id: &str,
) -> ContractResult<Vec<HistoryEntry>> {
    require_non_empty(&[("id", id)])?;

    stub.get_history_for_key(id)
        .await?
        .into_iter()
        .map(|modification| -> ContractResult<HistoryEntry> {
            let value = if modification.value.is_empty() {
                None
            } else {
                Some(decode(&modification.value)?)
            };
            Ok(HistoryEntry {
                tx_id: modification.tx_id,
                timestamp: modification.timestamp,
                is_delete: modification.is_delete,
                value,
            })
        })
        .collect()
}

/// Transactions between a creditor and debtor, ordered by timestamp then key
pub async fn transactions_for_pair(
    stub: &dyn ChaincodeStub,
    creditor_id: &str,
    debtor_id: &str,
) -> ContractResult<Vec<Transaction>> {
    let selector = Selector::new()
        .eq("creditorId", creditor_id)
        .eq("debtorId", debtor_id);

    let mut transactions = stub
        .get_query_result(&selector)
        .await?
        .iter()
        .map(|kv| decode::<Transaction>(&kv.value))
        .collect::<ContractResult<Vec<_>>>()?;

    transactions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    Ok(transactions)
}

/// Hash of the pair's chain tip, or empty when none can be found
async fn previous_hash_for(stub: &dyn ChaincodeStub, creditor_id: &str, debtor_id: &str) -> String {
    match transactions_for_pair(stub, creditor_id, debtor_id).await {
        Ok(transactions) => chain_tip(&transactions)
            .map(|tx| tx.hash.clone())
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(
                creditor = %creditor_id,
                debtor = %debtor_id,
                error = %e,
                "Previous hash lookup failed, starting a new chain"
            );
            String::new()
        }
    }
}

/// Recompute and link-check the chain of one creditor/debtor pair
pub async fn verify_transaction_chain(
    stub: &dyn ChaincodeStub,
    creditor_id: &str,
    debtor_id: &str,
) -> ContractResult<ChainReport> {
    require_non_empty(&[("creditorId", creditor_id), ("debtorId", debtor_id)])?;

    let transactions = transactions_for_pair(stub, creditor_id, debtor_id).await?;
    let (last_hash, error) = match walk_chain(&transactions) {
        Ok(chain) => (chain.last().map(|tx| tx.hash.clone()), None),
        Err(e) => {
            tracing::warn!(
                creditor = %creditor_id,
                debtor = %debtor_id,
                error = %e,
                "Chain verification failed"
            );
            (chain_tip(&transactions).map(|tx| tx.hash.clone()), Some(e.to_string()))
        }
    };

    Ok(ChainReport {
        creditor_id: creditor_id.to_string(),
        debtor_id: debtor_id.to_string(),
        length: transactions.len(),
        valid: error.is_none(),
        last_hash: last_hash.unwrap_or_default(),
        error,
    })
}
