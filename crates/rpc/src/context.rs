//! Application context - wires the ledger and the contract together

use std::path::Path;

use iu_core::{ContractError, UtilityConfig};
use iu_state::{CollectionConfig, CommitReceipt, Ledger, StateError, Transient};

use crate::contract::Contract;

/// Outcome of a committed invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub payload: Vec<u8>,
    pub receipt: CommitReceipt,
}

/// Application context - one ledger, one contract, one configuration
pub struct AppContext {
    ledger: Ledger,
    contract: Contract,
    config: UtilityConfig,
}

impl AppContext {
    /// Open (or create) a journaled ledger under `data_path`
    pub fn new(data_path: impl AsRef<Path>, config: UtilityConfig) -> Result<Self, InvokeError> {
        let ledger = Ledger::open(data_path)?.with_collection(kyc_collection(&config));
        Ok(Self::with_ledger(ledger, config))
    }

    /// Context over a ledger that is never written to disk
    pub fn in_memory(config: UtilityConfig) -> Self {
        let ledger = Ledger::in_memory().with_collection(kyc_collection(&config));
        Self::with_ledger(ledger, config)
    }

    fn with_ledger(ledger: Ledger, config: UtilityConfig) -> Self {
        Self {
            contract: Contract::new(&config),
            ledger,
            config,
        }
    }

    /// Run an entry point and commit its write set
    ///
    /// Flow: Begin → Dispatch → Validate reads → Journal → Apply.
    /// A failing operation leaves the ledger untouched.
    pub async fn submit(
        &self,
        identity: &str,
        function: &str,
        args: &[String],
        transient: Transient,
    ) -> Result<Invocation, InvokeError> {
        let stub = self.ledger.begin(identity, transient);
        let result = self.contract.invoke(&stub, function, args).await;

        match result {
            Ok(payload) => {
                let receipt = stub.commit()?;
                tracing::info!(
                    function,
                    tx_id = %receipt.tx_id,
                    block = receipt.block_number,
                    "Invocation committed"
                );
                Ok(Invocation { payload, receipt })
            }
            Err(e) => {
                tracing::warn!(
                    function,
                    identity,
                    error = %e,
                    "Invocation failed, write set discarded"
                );
                Err(e.into())
            }
        }
    }

    /// Run an entry point without committing anything
    pub async fn evaluate(
        &self,
        identity: &str,
        function: &str,
        args: &[String],
        transient: Transient,
    ) -> Result<Vec<u8>, InvokeError> {
        let stub = self.ledger.begin(identity, transient);
        Ok(self.contract.invoke(&stub, function, args).await?)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &UtilityConfig {
        &self.config
    }
}

/// The private KYC collection, readable by the admin identity only
fn kyc_collection(config: &UtilityConfig) -> CollectionConfig {
    CollectionConfig::new(config.kyc_collection.clone(), [config.admin_msp.clone()])
}

/// Errors during an invocation
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] StateError),
}

impl InvokeError {
    /// Error kind tag, as reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            InvokeError::Contract(e) => e.kind(),
            InvokeError::Ledger(StateError::MvccConflict(_)) => "MvccConflict",
            InvokeError::Ledger(_) => "StorageError",
        }
    }
}
