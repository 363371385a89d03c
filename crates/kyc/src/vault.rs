//! KYC disclosure vault operations

use std::sync::Arc;

use iu_core::{
    decode, encode, require_non_empty, sha256_hex, AccessPolicy, ContractError, ContractResult,
    Entity, KycIntegrity, KycReference, KycStatus, Operation, UtilityConfig,
};
use iu_state::ChaincodeStub;

/// Private Form-C storage with public hash references
pub struct KycVault {
    policy: Arc<dyn AccessPolicy>,
    collection: String,
    transient_key: String,
}

impl KycVault {
    pub fn new(
        policy: Arc<dyn AccessPolicy>,
        collection: impl Into<String>,
        transient_key: impl Into<String>,
    ) -> Self {
        Self {
            policy,
            collection: collection.into(),
            transient_key: transient_key.into(),
        }
    }

    pub fn from_config(config: &UtilityConfig, policy: Arc<dyn AccessPolicy>) -> Self {
        Self::new(
            policy,
            config.kyc_collection.clone(),
            config.formc_transient_key.clone(),
        )
    }

    fn authorize(&self, stub: &dyn ChaincodeStub, operation: Operation) -> ContractResult<String> {
        let identity = stub.creator_msp_id()?;
        if let Err(e) = self.policy.authorize(&identity, operation) {
            tracing::warn!(identity = %identity, operation = %operation, "KYC access denied");
            return Err(e);
        }
        Ok(identity)
    }

    async fn load_reference(
        &self,
        stub: &dyn ChaincodeStub,
        kyc_id: &str,
    ) -> ContractResult<KycReference> {
        require_non_empty(&[("kycId", kyc_id)])?;
        let bytes = stub
            .get_state(&KycReference::key_for(kyc_id))
            .await?
            .ok_or_else(|| ContractError::not_found(KycReference::KIND, kyc_id))?;
        decode(&bytes)
    }

    async fn load_payload(
        &self,
        stub: &dyn ChaincodeStub,
        kyc_id: &str,
    ) -> ContractResult<Vec<u8>> {
        stub.get_private_data(&self.collection, kyc_id)
            .await?
            .ok_or_else(|| ContractError::not_found("kyc form", kyc_id))
    }

    /// Store the transient Form-C privately and publish its digest
    pub async fn submit_form_c(
        &self,
        stub: &dyn ChaincodeStub,
        loan_id: &str,
        kyc_id: &str,
        party_id: &str,
    ) -> ContractResult<KycReference> {
        self.authorize(stub, Operation::SubmitKycFormC)?;
        require_non_empty(&[("loanId", loan_id), ("kycId", kyc_id), ("partyId", party_id)])?;

        let payload = stub
            .get_transient()?
            .remove(&self.transient_key)
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| {
                ContractError::validation(format!(
                    "transient field '{}' is required",
                    self.transient_key
                ))
            })?;

        let key = KycReference::key_for(kyc_id);
        if stub.get_state(&key).await?.is_some() {
            return Err(ContractError::already_exists(KycReference::KIND, kyc_id));
        }

        let hash = sha256_hex(&payload);
        stub.put_private_data(&self.collection, kyc_id, payload).await?;

        let reference = KycReference {
            kyc_id: kyc_id.to_string(),
            loan_id: loan_id.to_string(),
            party_id: party_id.to_string(),
            hash,
            status: KycStatus::Submitted,
            timestamp: stub.tx_timestamp(),
            remarks: String::new(),
        };

        let bytes = encode(&reference)?;
        stub.put_state(&key, bytes.clone()).await?;
        stub.set_event("KYC_SUBMITTED", bytes)?;

        tracing::info!(kyc_id = %kyc_id, loan_id = %loan_id, "KYC Form-C submitted");
        Ok(reference)
    }

    /// Decide a SUBMITTED reference once
    pub async fn approve(
        &self,
        stub: &dyn ChaincodeStub,
        kyc_id: &str,
        approved: bool,
        remarks: &str,
    ) -> ContractResult<KycReference> {
        self.authorize(stub, Operation::ApproveKyc)?;

        let mut reference = self.load_reference(stub, kyc_id).await?;
        if reference.status != KycStatus::Submitted {
            return Err(ContractError::invalid_state(format!(
                "kyc {} already {}",
                kyc_id, reference.status
            )));
        }

        reference.status = KycStatus::from_decision(approved);
        reference.timestamp = stub.tx_timestamp();
        reference.remarks = remarks.to_string();

        let bytes = encode(&reference)?;
        stub.put_state(&reference.state_key(), bytes.clone()).await?;
        stub.set_event("KYC_APPROVED", bytes)?;

        tracing::info!(kyc_id = %kyc_id, status = %reference.status, "KYC decided");
        Ok(reference)
    }

    /// Public reference; never includes the payload
    pub async fn get_reference(
        &self,
        stub: &dyn ChaincodeStub,
        kyc_id: &str,
    ) -> ContractResult<KycReference> {
        self.load_reference(stub, kyc_id).await
    }

    /// Raw private Form-C bytes (privileged)
    pub async fn read_form_c(
        &self,
        stub: &dyn ChaincodeStub,
        kyc_id: &str,
    ) -> ContractResult<Vec<u8>> {
        self.authorize(stub, Operation::ReadKycFormC)?;
        require_non_empty(&[("kycId", kyc_id)])?;
        self.load_payload(stub, kyc_id).await
    }

    /// Recompute the private payload digest and compare with the public hash
    pub async fn verify_integrity(
        &self,
        stub: &dyn ChaincodeStub,
        kyc_id: &str,
    ) -> ContractResult<KycIntegrity> {
        self.authorize(stub, Operation::VerifyKycIntegrity)?;

        let reference = self.load_reference(stub, kyc_id).await?;
        let private_hash = sha256_hex(&self.load_payload(stub, kyc_id).await?);
        let is_valid = private_hash == reference.hash;

        if !is_valid {
            tracing::warn!(kyc_id = %kyc_id, "KYC payload digest mismatch");
        }

        Ok(KycIntegrity {
            kyc_id: kyc_id.to_string(),
            is_valid,
            public_hash: reference.hash,
            private_hash,
        })
    }
}
