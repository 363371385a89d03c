//! Per-invocation stub over a [`Ledger`]

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{StateError, StateResult};
use crate::ledger::{CommitReceipt, Ledger};
use crate::selector::Selector;
use crate::stub::{ChaincodeStub, KeyModification, KeyValue, Transient};

/// Buffered reads and writes of one invocation
#[derive(Debug, Default)]
pub(crate) struct ReadWriteSet {
    /// Observed version per key (`None` = absent)
    pub reads: BTreeMap<String, Option<u64>>,
    pub private_reads: BTreeMap<(String, String), Option<u64>>,
    /// Pending value per key (`None` = delete)
    pub writes: BTreeMap<String, Option<Vec<u8>>>,
    pub private_writes: BTreeMap<(String, String), Vec<u8>>,
    pub event: Option<(String, Vec<u8>)>,
}

/// State accessor for a single invocation
///
/// Reads see committed state only. Writes stay buffered until
/// [`TxStub::commit`]; dropping the stub discards them.
pub struct TxStub<'a> {
    ledger: &'a Ledger,
    tx_id: String,
    timestamp: DateTime<Utc>,
    creator: String,
    transient: Transient,
    rwset: Mutex<ReadWriteSet>,
}

impl<'a> TxStub<'a> {
    pub(crate) fn new(
        ledger: &'a Ledger,
        tx_id: String,
        timestamp: DateTime<Utc>,
        creator: String,
        transient: Transient,
    ) -> Self {
        Self {
            ledger,
            tx_id,
            timestamp,
            creator,
            transient,
            rwset: Mutex::new(ReadWriteSet::default()),
        }
    }

    /// Whether anything would be written on commit
    pub fn has_writes(&self) -> StateResult<bool> {
        let rwset = self.lock()?;
        Ok(!rwset.writes.is_empty() || !rwset.private_writes.is_empty() || rwset.event.is_some())
    }

    /// Validate the read set and apply the write set atomically
    pub fn commit(self) -> StateResult<CommitReceipt> {
        let rwset = self.rwset.into_inner().map_err(|_| StateError::Poisoned)?;
        let receipt = self
            .ledger
            .commit(&self.tx_id, self.timestamp, &self.creator, rwset)?;

        tracing::debug!(
            tx_id = %receipt.tx_id,
            block = receipt.block_number,
            writes = receipt.writes,
            "Invocation committed"
        );
        Ok(receipt)
    }

    fn lock(&self) -> StateResult<MutexGuard<'_, ReadWriteSet>> {
        self.rwset.lock().map_err(|_| StateError::Poisoned)
    }

    fn check_member(&self, collection: &str) -> StateResult<()> {
        let config = self.ledger.collection(collection)?;
        if config.is_member(&self.creator) {
            Ok(())
        } else {
            Err(StateError::AccessDenied {
                collection: collection.to_string(),
                identity: self.creator.clone(),
            })
        }
    }
}

fn require_key(key: &str) -> StateResult<()> {
    if key.is_empty() {
        Err(StateError::EmptyKey)
    } else {
        Ok(())
    }
}

#[async_trait]
impl<'a> ChaincodeStub for TxStub<'a> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn creator_msp_id(&self) -> StateResult<String> {
        Ok(self.creator.clone())
    }

    fn get_transient(&self) -> StateResult<Transient> {
        Ok(self.transient.clone())
    }

    fn set_event(&self, name: &str, payload: Vec<u8>) -> StateResult<()> {
        self.lock()?.event = Some((name.to_string(), payload));
        Ok(())
    }

    async fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        require_key(key)?;
        let current = self.ledger.read_public(key)?;
        self.lock()?
            .reads
            .insert(key.to_string(), current.as_ref().map(|v| v.version));
        Ok(current.map(|v| v.value))
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> StateResult<()> {
        require_key(key)?;
        self.lock()?.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    async fn del_state(&self, key: &str) -> StateResult<()> {
        require_key(key)?;
        self.lock()?.writes.insert(key.to_string(), None);
        Ok(())
    }

    async fn get_state_by_range(&self, start: &str, end: &str) -> StateResult<Vec<KeyValue>> {
        let entries = self.ledger.read_range(start, end)?;
        let mut rwset = self.lock()?;

        Ok(entries
            .into_iter()
            .map(|(key, v)| {
                rwset.reads.insert(key.clone(), Some(v.version));
                KeyValue {
                    key,
                    value: v.value,
                }
            })
            .collect())
    }

    async fn get_query_result(&self, selector: &Selector) -> StateResult<Vec<KeyValue>> {
        self.ledger.query(selector)
    }

    async fn get_history_for_key(&self, key: &str) -> StateResult<Vec<KeyModification>> {
        require_key(key)?;
        self.ledger.history(key)
    }

    async fn get_private_data(&self, collection: &str, key: &str) -> StateResult<Option<Vec<u8>>> {
        require_key(key)?;
        self.check_member(collection)?;
        let current = self.ledger.read_private(collection, key)?;
        self.lock()?.private_reads.insert(
            (collection.to_string(), key.to_string()),
            current.as_ref().map(|v| v.version),
        );
        Ok(current.map(|v| v.value))
    }

    async fn put_private_data(
        &self,
        collection: &str,
        key: &str,
        value: Vec<u8>,
    ) -> StateResult<()> {
        require_key(key)?;
        self.check_member(collection)?;
        self.lock()?
            .private_writes
            .insert((collection.to_string(), key.to_string()), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let ledger = Ledger::in_memory();
        let stub = ledger.begin("A", Transient::new());

        assert!(matches!(stub.get_state("").await, Err(StateError::EmptyKey)));
        assert!(matches!(stub.put_state("", vec![]).await, Err(StateError::EmptyKey)));
        assert!(!stub.has_writes().unwrap());
    }

    #[tokio::test]
    async fn test_later_event_replaces_earlier() {
        let ledger = Ledger::in_memory();
        let stub = ledger.begin("A", Transient::new());
        stub.set_event("FIRST", b"1".to_vec()).unwrap();
        stub.set_event("SECOND", b"2".to_vec()).unwrap();
        let tx_id = stub.tx_id().to_string();

        let receipt = stub.commit().unwrap();
        assert_eq!(receipt.event.as_deref(), Some("SECOND"));

        let events = ledger.events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tx_id, tx_id);
        assert_eq!(events[0].payload, b"2".to_vec());
    }

    #[tokio::test]
    async fn test_rich_query_matches_fields() {
        let ledger = Ledger::in_memory();
        let stub = ledger.begin("A", Transient::new());
        stub.put_state("D1", br#"{"loanId":"L1","docId":"D1"}"#.to_vec())
            .await
            .unwrap();
        stub.put_state("D2", br#"{"loanId":"L2","docId":"D2"}"#.to_vec())
            .await
            .unwrap();
        stub.put_state("RAW", b"not json".to_vec()).await.unwrap();
        stub.commit().unwrap();

        let stub = ledger.begin("A", Transient::new());
        let found = stub
            .get_query_result(&Selector::new().eq("loanId", "L1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "D1");
    }

    #[tokio::test]
    async fn test_range_read_conflicts_on_change() {
        let ledger = Ledger::in_memory();
        let seed = ledger.begin("A", Transient::new());
        seed.put_state("A1", b"1".to_vec()).await.unwrap();
        seed.commit().unwrap();

        let scanner = ledger.begin("A", Transient::new());
        assert_eq!(scanner.get_state_by_range("", "").await.unwrap().len(), 1);
        scanner.put_state("SUMMARY", b"1".to_vec()).await.unwrap();

        let writer = ledger.begin("B", Transient::new());
        writer.put_state("A1", b"2".to_vec()).await.unwrap();
        writer.commit().unwrap();

        assert!(matches!(scanner.commit(), Err(StateError::MvccConflict(_))));
    }

    #[tokio::test]
    async fn test_transient_and_identity_exposed() {
        let ledger = Ledger::in_memory();
        let mut transient = Transient::new();
        transient.insert("formc".to_string(), b"secret".to_vec());

        let stub = ledger.begin("AdminMSP", transient);
        assert_eq!(stub.creator_msp_id().unwrap(), "AdminMSP");
        assert_eq!(
            stub.get_transient().unwrap().get("formc"),
            Some(&b"secret".to_vec())
        );
    }
}
