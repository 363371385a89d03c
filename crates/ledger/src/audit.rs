//! Audit trail generator
//!
//! One [`AuditRecord`] per mutating transaction operation, keyed
//! `AUDIT_<txnId>_<ACTION>_<unixNanos>`. When that key is taken a numeric
//! suffix is appended until a free key is found.

use chrono::{DateTime, Utc};
use iu_core::{
    decode, encode, require_non_empty, AuditAction, AuditEvent, AuditRecord, ComplianceStatus,
    ContractResult,
};
use iu_state::{ChaincodeStub, Selector};

/// Nanoseconds since the Unix epoch, saturating outside the i64 range
pub(crate) fn unix_nanos(timestamp: DateTime<Utc>) -> i64 {
    timestamp
        .timestamp_nanos_opt()
        .unwrap_or_else(|| timestamp.timestamp_micros().saturating_mul(1_000))
}

/// First key in `base`, `base_1`, `base_2`, … that holds no committed value
async fn free_key(stub: &dyn ChaincodeStub, base: &str) -> ContractResult<String> {
    if stub.get_state(base).await?.is_none() {
        return Ok(base.to_string());
    }

    let mut n: u32 = 1;
    loop {
        let candidate = format!("{}_{}", base, n);
        if stub.get_state(&candidate).await?.is_none() {
            tracing::debug!(key = %candidate, "Audit key collision resolved with suffix");
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Build and persist the audit record for one transaction operation
pub async fn record(
    stub: &dyn ChaincodeStub,
    transaction_id: &str,
    action: AuditAction,
    compliance_status: ComplianceStatus,
    details: String,
) -> ContractResult<AuditRecord> {
    let timestamp = stub.tx_timestamp();
    let base = format!(
        "{}_{}",
        AuditRecord::key_prefix(transaction_id, action),
        unix_nanos(timestamp)
    );
    let id = free_key(stub, &base).await?;

    let audit = AuditRecord {
        id,
        transaction_id: transaction_id.to_string(),
        action,
        actor: stub.creator_msp_id()?,
        timestamp,
        details,
        compliance_status,
    };

    stub.put_state(&audit.id, encode(&audit)?).await?;
    tracing::debug!(audit_id = %audit.id, action = %action, "Audit record written");
    Ok(audit)
}

/// Mirror a free-form audit event onto the ledger
pub async fn record_audit_event(
    stub: &dyn ChaincodeStub,
    event_type: &str,
    ref_id: &str,
    hash: &str,
    details: &str,
) -> ContractResult<AuditEvent> {
    require_non_empty(&[("eventType", event_type), ("refId", ref_id)])?;

    let timestamp = stub.tx_timestamp();
    let base = format!("{}_{}", AuditEvent::key_prefix(ref_id), unix_nanos(timestamp));
    let key = free_key(stub, &base).await?;

    let event = AuditEvent {
        event_type: event_type.to_string(),
        ref_id: ref_id.to_string(),
        hash: hash.to_string(),
        details: details.to_string(),
        timestamp,
    };

    stub.put_state(&key, encode(&event)?).await?;
    tracing::info!(key = %key, event_type, "Audit event recorded");
    Ok(event)
}

/// All audit records of one transaction, oldest first
pub async fn get_audit_trail(
    stub: &dyn ChaincodeStub,
    transaction_id: &str,
) -> ContractResult<Vec<AuditRecord>> {
    require_non_empty(&[("transactionId", transaction_id)])?;

    let selector = Selector::new().eq("transactionId", transaction_id);
    let mut trail: Vec<AuditRecord> = stub
        .get_query_result(&selector)
        .await?
        .iter()
        .filter_map(|kv| decode(&kv.value).ok())
        .collect();

    trail.sort_by(|a: &AuditRecord, b: &AuditRecord| {
        a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id))
    });
    Ok(trail)
}
