//! In-memory versioned ledger with optional JSONL journal
//!
//! Each invocation runs against its own [`TxStub`]. Commit validates the
//! read set against current versions, journals the block, then applies the
//! whole write set under one lock. A failed or dropped stub leaves no trace,
//! and replay skips blocks whose private half never reached the journal.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::error::{StateError, StateResult};
use crate::journal::{BlockRecord, Journal, PrivateBlockRecord, PrivateWriteRecord, WriteRecord};
use crate::selector::Selector;
use crate::stub::{ChaincodeEvent, KeyModification, KeyValue, Transient};
use crate::tx::{ReadWriteSet, TxStub};

/// Private collection definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    pub name: String,
    /// Identities allowed to read and write the collection
    pub members: HashSet<String>,
}

impl CollectionConfig {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_member(&self, identity: &str) -> bool {
        self.members.contains(identity)
    }
}

/// Outcome of a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx_id: String,
    pub block_number: u64,
    pub writes: usize,
    pub private_writes: usize,
    pub event: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Versioned {
    pub value: Vec<u8>,
    pub version: u64,
}

#[derive(Debug, Default)]
pub(crate) struct WorldState {
    public: BTreeMap<String, Versioned>,
    history: HashMap<String, Vec<KeyModification>>,
    private: HashMap<String, BTreeMap<String, Versioned>>,
    events: Vec<ChaincodeEvent>,
    height: u64,
}

impl WorldState {
    fn apply_block(&mut self, block: &BlockRecord) {
        for write in &block.writes {
            if write.is_delete {
                self.public.remove(&write.key);
            } else {
                self.public.insert(
                    write.key.clone(),
                    Versioned {
                        value: write.value.clone(),
                        version: block.number,
                    },
                );
            }

            self.history
                .entry(write.key.clone())
                .or_default()
                .push(KeyModification {
                    tx_id: block.tx_id.clone(),
                    timestamp: block.timestamp,
                    is_delete: write.is_delete,
                    value: write.value.clone(),
                });
        }

        if let Some(ref event) = block.event {
            self.events.push(event.clone());
        }

        self.height = self.height.max(block.number);
    }

    fn apply_private(&mut self, block: &PrivateBlockRecord) {
        for write in &block.writes {
            self.private.entry(write.collection.clone()).or_default().insert(
                write.key.clone(),
                Versioned {
                    value: write.value.clone(),
                    version: block.number,
                },
            );
        }
        self.height = self.height.max(block.number);
    }

    fn version_of(&self, key: &str) -> Option<u64> {
        self.public.get(key).map(|v| v.version)
    }

    fn private_version_of(&self, collection: &str, key: &str) -> Option<u64> {
        self.private
            .get(collection)
            .and_then(|c| c.get(key))
            .map(|v| v.version)
    }
}

struct Journals {
    public: Journal,
    private: Journal,
}

/// Versioned key-value ledger
pub struct Ledger {
    state: RwLock<WorldState>,
    journals: Option<Mutex<Journals>>,
    collections: HashMap<String, CollectionConfig>,
}

impl Ledger {
    /// Create a ledger that lives only in memory (for testing)
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(WorldState::default()),
            journals: None,
            collections: HashMap::new(),
        }
    }

    /// Open a journaled ledger under `data_path`, replaying existing blocks
    pub fn open(data_path: impl AsRef<Path>) -> StateResult<Self> {
        let data_path = data_path.as_ref();
        let public = Journal::new(data_path.join("public"))?;
        let private = Journal::new(data_path.join("private"))?;

        let mut blocks: Vec<BlockRecord> = public.read_all()?;
        blocks.sort_by_key(|b| b.number);

        let private_blocks: Vec<PrivateBlockRecord> = private.read_all()?;
        let private_total = private_blocks.len();
        let mut private_by_block: HashMap<(u64, String), PrivateBlockRecord> = private_blocks
            .into_iter()
            .map(|b| ((b.number, b.tx_id.clone()), b))
            .collect();

        let mut state = WorldState::default();
        let mut applied = 0;
        for block in &blocks {
            if block.private_writes > 0 {
                match private_by_block.remove(&(block.number, block.tx_id.clone())) {
                    Some(private_block) => state.apply_private(&private_block),
                    None => {
                        tracing::warn!(
                            block = block.number,
                            tx_id = %block.tx_id,
                            "Block without its private half, skipped"
                        );
                        continue;
                    }
                }
            }
            state.apply_block(block);
            applied += 1;
        }

        tracing::debug!(
            path = %data_path.display(),
            blocks = applied,
            skipped = blocks.len() - applied,
            private_blocks = private_total,
            unmarked_private = private_by_block.len(),
            height = state.height,
            "Ledger replayed from journal"
        );

        Ok(Self {
            state: RwLock::new(state),
            journals: Some(Mutex::new(Journals { public, private })),
            collections: HashMap::new(),
        })
    }

    /// Register a private collection
    pub fn with_collection(mut self, collection: CollectionConfig) -> Self {
        self.collections.insert(collection.name.clone(), collection);
        self
    }

    /// Start an invocation stamped with the current time
    pub fn begin(&self, creator: impl Into<String>, transient: Transient) -> TxStub<'_> {
        self.begin_at(creator, transient, Utc::now())
    }

    /// Start an invocation with an explicit proposal timestamp
    pub fn begin_at(
        &self,
        creator: impl Into<String>,
        transient: Transient,
        timestamp: DateTime<Utc>,
    ) -> TxStub<'_> {
        TxStub::new(
            self,
            uuid::Uuid::new_v4().to_string(),
            timestamp,
            creator.into(),
            transient,
        )
    }

    /// Committed value of a public key
    pub fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        Ok(self.read_state()?.public.get(key).map(|v| v.value.clone()))
    }

    /// Committed value of a private key, bypassing collection membership
    pub fn peek_private(&self, collection: &str, key: &str) -> StateResult<Option<Vec<u8>>> {
        Ok(self
            .read_state()?
            .private
            .get(collection)
            .and_then(|c| c.get(key))
            .map(|v| v.value.clone()))
    }

    /// All live public keys in order
    pub fn keys(&self) -> StateResult<Vec<String>> {
        Ok(self.read_state()?.public.keys().cloned().collect())
    }

    /// All events of committed invocations, oldest first
    pub fn events(&self) -> StateResult<Vec<ChaincodeEvent>> {
        Ok(self.read_state()?.events.clone())
    }

    /// Number of the last committed block
    pub fn height(&self) -> StateResult<u64> {
        Ok(self.read_state()?.height)
    }

    pub fn is_journaled(&self) -> bool {
        self.journals.is_some()
    }

    pub(crate) fn collection(&self, name: &str) -> StateResult<&CollectionConfig> {
        self.collections
            .get(name)
            .ok_or_else(|| StateError::UnknownCollection(name.to_string()))
    }

    pub(crate) fn read_public(&self, key: &str) -> StateResult<Option<Versioned>> {
        Ok(self.read_state()?.public.get(key).cloned())
    }

    pub(crate) fn read_private(
        &self,
        collection: &str,
        key: &str,
    ) -> StateResult<Option<Versioned>> {
        Ok(self
            .read_state()?
            .private
            .get(collection)
            .and_then(|c| c.get(key))
            .cloned())
    }

    pub(crate) fn read_range(
        &self,
        start: &str,
        end: &str,
    ) -> StateResult<Vec<(String, Versioned)>> {
        let state = self.read_state()?;
        Ok(state
            .public
            .range(start.to_string()..)
            .take_while(|(key, _)| end.is_empty() || key.as_str() < end)
            .map(|(key, v)| (key.clone(), v.clone()))
            .collect())
    }

    pub(crate) fn query(&self, selector: &Selector) -> StateResult<Vec<KeyValue>> {
        let state = self.read_state()?;
        Ok(state
            .public
            .iter()
            .filter(|(_, v)| selector.matches_bytes(&v.value))
            .map(|(key, v)| KeyValue {
                key: key.clone(),
                value: v.value.clone(),
            })
            .collect())
    }

    pub(crate) fn history(&self, key: &str) -> StateResult<Vec<KeyModification>> {
        Ok(self
            .read_state()?
            .history
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    /// Validate and apply one invocation's read/write set
    pub(crate) fn commit(
        &self,
        tx_id: &str,
        timestamp: DateTime<Utc>,
        creator: &str,
        rwset: ReadWriteSet,
    ) -> StateResult<CommitReceipt> {
        let mut state = self.write_state()?;

        for (key, seen) in &rwset.reads {
            if state.version_of(key) != *seen {
                tracing::warn!(tx_id, key = %key, "MVCC read conflict");
                return Err(StateError::MvccConflict(key.clone()));
            }
        }
        for ((collection, key), seen) in &rwset.private_reads {
            if state.private_version_of(collection, key) != *seen {
                tracing::warn!(tx_id, collection = %collection, "MVCC private read conflict");
                return Err(StateError::MvccConflict(format!("{}/{}", collection, key)));
            }
        }

        let number = state.height + 1;
        let event_name = rwset.event.as_ref().map(|(name, _)| name.clone());

        let private_block = PrivateBlockRecord {
            number,
            tx_id: tx_id.to_string(),
            timestamp,
            writes: rwset
                .private_writes
                .into_iter()
                .map(|((collection, key), value)| PrivateWriteRecord {
                    collection,
                    key,
                    value,
                })
                .collect(),
        };

        let block = BlockRecord {
            number,
            tx_id: tx_id.to_string(),
            timestamp,
            creator: creator.to_string(),
            writes: rwset
                .writes
                .into_iter()
                .map(|(key, value)| WriteRecord {
                    key,
                    is_delete: value.is_none(),
                    value: value.unwrap_or_default(),
                })
                .collect(),
            private_writes: private_block.writes.len(),
            event: rwset.event.map(|(name, payload)| ChaincodeEvent {
                tx_id: tx_id.to_string(),
                name,
                payload,
            }),
        };

        if let Some(ref journals) = self.journals {
            let mut journals = journals.lock().map_err(|_| StateError::Poisoned)?;
            // Public line last: it marks the block committed
            if !private_block.writes.is_empty() {
                journals.private.append(timestamp, &private_block)?;
            }
            journals.public.append(timestamp, &block)?;
        }

        state.apply_block(&block);
        state.apply_private(&private_block);

        Ok(CommitReceipt {
            tx_id: tx_id.to_string(),
            block_number: number,
            writes: block.writes.len(),
            private_writes: private_block.writes.len(),
            event: event_name,
        })
    }

    fn read_state(&self) -> StateResult<RwLockReadGuard<'_, WorldState>> {
        self.state.read().map_err(|_| StateError::Poisoned)
    }

    fn write_state(&self) -> StateResult<RwLockWriteGuard<'_, WorldState>> {
        self.state.write().map_err(|_| StateError::Poisoned)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::ChaincodeStub;
    use tempfile::TempDir;

    fn admin_ledger() -> Ledger {
        Ledger::in_memory().with_collection(CollectionConfig::new("secrets", ["AdminMSP"]))
    }

    #[tokio::test]
    async fn test_writes_invisible_until_commit() {
        let ledger = Ledger::in_memory();
        let stub = ledger.begin("CreditorMSP", Transient::new());

        stub.put_state("K1", b"v1".to_vec()).await.unwrap();
        assert_eq!(stub.get_state("K1").await.unwrap(), None);
        assert_eq!(ledger.get("K1").unwrap(), None);

        let receipt = stub.commit().unwrap();
        assert_eq!(receipt.block_number, 1);
        assert_eq!(ledger.get("K1").unwrap(), Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn test_dropped_stub_leaves_no_state() {
        let ledger = Ledger::in_memory();
        {
            let stub = ledger.begin("CreditorMSP", Transient::new());
            stub.put_state("K1", b"v1".to_vec()).await.unwrap();
            stub.set_event("E", b"payload".to_vec()).unwrap();
        }

        assert!(ledger.keys().unwrap().is_empty());
        assert!(ledger.events().unwrap().is_empty());
        assert_eq!(ledger.height().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_conflicting_read_is_rejected() {
        let ledger = Ledger::in_memory();

        let first = ledger.begin("A", Transient::new());
        let second = ledger.begin("B", Transient::new());

        assert_eq!(first.get_state("T1").await.unwrap(), None);
        assert_eq!(second.get_state("T1").await.unwrap(), None);
        first.put_state("T1", b"first".to_vec()).await.unwrap();
        second.put_state("T1", b"second".to_vec()).await.unwrap();

        first.commit().unwrap();
        let result = second.commit();

        assert!(matches!(result, Err(StateError::MvccConflict(key)) if key == "T1"));
        assert_eq!(ledger.get("T1").unwrap(), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn test_range_scan_bounds() {
        let ledger = Ledger::in_memory();
        let stub = ledger.begin("A", Transient::new());
        for key in ["A1", "B1", "B2", "C1"] {
            stub.put_state(key, b"{}".to_vec()).await.unwrap();
        }
        stub.commit().unwrap();

        let stub = ledger.begin("A", Transient::new());
        let keys: Vec<String> = stub
            .get_state_by_range("B", "C")
            .await
            .unwrap()
            .into_iter()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["B1", "B2"]);

        let all = stub.get_state_by_range("", "").await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_history_records_deletes() {
        let ledger = Ledger::in_memory();

        let stub = ledger.begin("A", Transient::new());
        stub.put_state("K", b"v1".to_vec()).await.unwrap();
        let first_tx = stub.tx_id().to_string();
        stub.commit().unwrap();

        let stub = ledger.begin("A", Transient::new());
        stub.del_state("K").await.unwrap();
        stub.commit().unwrap();

        let stub = ledger.begin("A", Transient::new());
        let history = stub.get_history_for_key("K").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].tx_id, first_tx);
        assert!(!history[0].is_delete);
        assert!(history[1].is_delete);
        assert!(history[1].value.is_empty());
        assert_eq!(stub.get_state("K").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_private_collection_membership() {
        let ledger = admin_ledger();

        let outsider = ledger.begin("CreditorMSP", Transient::new());
        let result = outsider.put_private_data("secrets", "K", b"x".to_vec()).await;
        assert!(matches!(result, Err(StateError::AccessDenied { .. })));

        let admin = ledger.begin("AdminMSP", Transient::new());
        admin.put_private_data("secrets", "K", b"x".to_vec()).await.unwrap();
        let receipt = admin.commit().unwrap();
        assert_eq!(receipt.private_writes, 1);

        assert!(ledger.keys().unwrap().is_empty());
        assert_eq!(ledger.peek_private("secrets", "K").unwrap(), Some(b"x".to_vec()));

        let outsider = ledger.begin("CreditorMSP", Transient::new());
        assert!(outsider.get_private_data("secrets", "K").await.is_err());

        let unknown = ledger.begin("AdminMSP", Transient::new());
        let result = unknown.get_private_data("nope", "K").await;
        assert!(matches!(result, Err(StateError::UnknownCollection(_))));
    }

    #[tokio::test]
    async fn test_journal_replay_restores_state() {
        let dir = TempDir::new().unwrap();

        {
            let ledger = Ledger::open(dir.path())
                .unwrap()
                .with_collection(CollectionConfig::new("secrets", ["AdminMSP"]));
            let stub = ledger.begin("AdminMSP", Transient::new());
            stub.put_state("K1", b"{\"a\":1}".to_vec()).await.unwrap();
            stub.put_private_data("secrets", "P1", b"hidden".to_vec()).await.unwrap();
            stub.set_event("CREATED", b"K1".to_vec()).unwrap();
            stub.commit().unwrap();
        }

        let ledger = Ledger::open(dir.path()).unwrap();
        assert_eq!(ledger.height().unwrap(), 1);
        assert_eq!(ledger.get("K1").unwrap(), Some(b"{\"a\":1}".to_vec()));
        assert_eq!(ledger.peek_private("secrets", "P1").unwrap(), Some(b"hidden".to_vec()));
        assert_eq!(ledger.events().unwrap()[0].name, "CREATED");
    }

    #[tokio::test]
    async fn test_failed_private_append_commits_nothing() {
        let dir = TempDir::new().unwrap();

        {
            let ledger = Ledger::open(dir.path())
                .unwrap()
                .with_collection(CollectionConfig::new("secrets", ["AdminMSP"]));
            std::fs::remove_dir_all(dir.path().join("private")).unwrap();

            let stub = ledger.begin("AdminMSP", Transient::new());
            stub.put_state("KYC_K1", b"{}".to_vec()).await.unwrap();
            stub.put_private_data("secrets", "K1", b"form".to_vec()).await.unwrap();
            assert!(matches!(stub.commit(), Err(StateError::Io(_))));

            assert_eq!(ledger.get("KYC_K1").unwrap(), None);
            assert_eq!(ledger.height().unwrap(), 0);
        }

        let ledger = Ledger::open(dir.path()).unwrap();
        assert_eq!(ledger.get("KYC_K1").unwrap(), None);
        assert_eq!(ledger.peek_private("secrets", "K1").unwrap(), None);
        assert_eq!(ledger.height().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replay_requires_both_halves() {
        let dir = TempDir::new().unwrap();
        let ts = Utc::now();

        {
            let mut public = Journal::new(dir.path().join("public")).unwrap();
            let mut private = Journal::new(dir.path().join("private")).unwrap();

            // Block 1: public marker claiming a private half that is missing
            public
                .append(
                    ts,
                    &BlockRecord {
                        number: 1,
                        tx_id: "tx-1".to_string(),
                        timestamp: ts,
                        creator: "AdminMSP".to_string(),
                        writes: vec![WriteRecord {
                            key: "KYC_K1".to_string(),
                            value: b"{}".to_vec(),
                            is_delete: false,
                        }],
                        private_writes: 1,
                        event: None,
                    },
                )
                .unwrap();

            // Block 2: private half without its public marker
            private
                .append(
                    ts,
                    &PrivateBlockRecord {
                        number: 2,
                        tx_id: "tx-2".to_string(),
                        timestamp: ts,
                        writes: vec![PrivateWriteRecord {
                            collection: "secrets".to_string(),
                            key: "K2".to_string(),
                            value: b"form".to_vec(),
                        }],
                    },
                )
                .unwrap();
        }

        let ledger = Ledger::open(dir.path()).unwrap();
        assert_eq!(ledger.get("KYC_K1").unwrap(), None);
        assert_eq!(ledger.peek_private("secrets", "K2").unwrap(), None);
        assert_eq!(ledger.height().unwrap(), 0);
    }
}
