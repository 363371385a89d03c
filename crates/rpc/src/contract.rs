//! Contract dispatcher - named entry points with string arguments
//!
//! Maps the entry point name onto an [`Operation`], checks the argument count,
//! parses typed arguments, authorizes the caller and runs the operation.
//! Every result is returned as a JSON payload except `ReadKYCFormC`, which
//! hands back the private bytes unchanged.

use std::str::FromStr;
use std::sync::Arc;

use iu_core::{
    encode, AccessPolicy, ContractError, ContractResult, Operation, RolePolicy, UtilityConfig,
};
use iu_documents::{DocumentRegistry, DocumentSubmission};
use iu_kyc::KycVault;
use iu_ledger::{audit, bootstrap, engine, TransactionRequest};
use iu_state::ChaincodeStub;

/// Positional arguments for an entry point taking exactly `N`
fn expect_args<const N: usize>(operation: Operation, args: &[String]) -> ContractResult<[&str; N]> {
    if args.len() != N {
        return Err(ContractError::validation(format!(
            "{} expects {} arguments, got {}",
            operation,
            N,
            args.len()
        )));
    }

    let mut out = [""; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_str();
    }
    Ok(out)
}

/// Strict boolean argument: `true` or `false`
fn parse_bool(name: &str, value: &str) -> ContractResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ContractError::validation(format!(
            "{} must be true or false, got {:?}",
            name, other
        ))),
    }
}

/// The Information Utility contract
pub struct Contract {
    policy: Arc<dyn AccessPolicy>,
    documents: DocumentRegistry,
    kyc: KycVault,
}

impl Contract {
    pub fn new(config: &UtilityConfig) -> Self {
        Self::with_policy(config, Arc::new(RolePolicy::from_config(config)))
    }

    pub fn with_policy(config: &UtilityConfig, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            documents: DocumentRegistry::new(Arc::clone(&policy)),
            kyc: KycVault::from_config(config, Arc::clone(&policy)),
            policy,
        }
    }

    /// Resolve an entry point name
    pub fn operation(function: &str) -> ContractResult<Operation> {
        Operation::from_str(function)
            .map_err(|_| ContractError::validation(format!("unknown function {:?}", function)))
    }

    /// Run one entry point against the invocation's stub
    pub async fn invoke(
        &self,
        stub: &dyn ChaincodeStub,
        function: &str,
        args: &[String],
    ) -> ContractResult<Vec<u8>> {
        let operation = Self::operation(function)?;
        let identity = stub.creator_msp_id()?;
        self.policy.authorize(&identity, operation)?;

        tracing::debug!(
            function = %operation,
            identity = %identity,
            tx_id = stub.tx_id(),
            args = args.len(),
            "Dispatching invocation"
        );

        match operation {
            Operation::InitLedger => {
                expect_args::<0>(operation, args)?;
                encode(&bootstrap::init_ledger(stub).await?)
            }
            Operation::CreateTransaction => {
                let [id, creditor_id, debtor_id, amount, currency, transaction_type, description] =
                    expect_args::<7>(operation, args)?;
                let request = TransactionRequest {
                    id: id.to_string(),
                    creditor_id: creditor_id.to_string(),
                    debtor_id: debtor_id.to_string(),
                    amount: amount.to_string(),
                    currency: currency.to_string(),
                    transaction_type: transaction_type.to_string(),
                    description: description.to_string(),
                };
                encode(&engine::create_transaction(stub, &request).await?)
            }
            Operation::ProcessTransaction => {
                let [id] = expect_args::<1>(operation, args)?;
                encode(&engine::process_transaction(stub, id).await?)
            }
            Operation::PerformComplianceCheck => {
                let [id, approved] = expect_args::<2>(operation, args)?;
                let approved = parse_bool("approved", approved)?;
                encode(&engine::perform_compliance_check(stub, id, approved).await?)
            }
            Operation::ReadTransaction => {
                let [id] = expect_args::<1>(operation, args)?;
                encode(&engine::read_transaction(stub, id).await?)
            }
            Operation::TransactionExists => {
                let [id] = expect_args::<1>(operation, args)?;
                encode(&engine::transaction_exists(stub, id).await?)
            }
            Operation::GetAllTransactions => {
                expect_args::<0>(operation, args)?;
                encode(&engine::get_all_transactions(stub).await?)
            }
            Operation::GetTransactionHistory => {
                let [id] = expect_args::<1>(operation, args)?;
                encode(&engine::get_transaction_history(stub, id).await?)
            }
            Operation::VerifyTransactionChain => {
                let [creditor_id, debtor_id] = expect_args::<2>(operation, args)?;
                encode(&engine::verify_transaction_chain(stub, creditor_id, debtor_id).await?)
            }
            Operation::GetAuditTrail => {
                let [transaction_id] = expect_args::<1>(operation, args)?;
                encode(&audit::get_audit_trail(stub, transaction_id).await?)
            }
            Operation::RecordAuditEvent => {
                let [event_type, ref_id, hash, details] = expect_args::<4>(operation, args)?;
                encode(&audit::record_audit_event(stub, event_type, ref_id, hash, details).await?)
            }
            Operation::SubmitLoanDocument => {
                let [loan_id, doc_id, hash, doc_type, mime, size, metadata] =
                    expect_args::<7>(operation, args)?;
                let submission = DocumentSubmission {
                    loan_id: loan_id.to_string(),
                    doc_id: doc_id.to_string(),
                    hash: hash.to_string(),
                    doc_type: doc_type.to_string(),
                    mime: mime.to_string(),
                    size: size.to_string(),
                    metadata: metadata.to_string(),
                };
                encode(&self.documents.submit(stub, &submission).await?)
            }
            Operation::GetDocument => {
                let [doc_id] = expect_args::<1>(operation, args)?;
                encode(&self.documents.get(stub, doc_id).await?)
            }
            Operation::GetLoanDocuments => {
                let [loan_id] = expect_args::<1>(operation, args)?;
                encode(&self.documents.loan_documents(stub, loan_id).await?)
            }
            Operation::VerifyDocumentHash => {
                let [doc_id, provided_hash] = expect_args::<2>(operation, args)?;
                encode(&self.documents.verify_hash(stub, doc_id, provided_hash).await?)
            }
            Operation::ReviewDocument => {
                let [doc_id, verified] = expect_args::<2>(operation, args)?;
                let verified = parse_bool("verified", verified)?;
                encode(&self.documents.review(stub, doc_id, verified).await?)
            }
            Operation::SubmitKycFormC => {
                let [loan_id, kyc_id, party_id] = expect_args::<3>(operation, args)?;
                encode(&self.kyc.submit_form_c(stub, loan_id, kyc_id, party_id).await?)
            }
            Operation::ApproveKyc => {
                let [kyc_id, approved, remarks] = expect_args::<3>(operation, args)?;
                let approved = parse_bool("approved", approved)?;
                encode(&self.kyc.approve(stub, kyc_id, approved, remarks).await?)
            }
            Operation::GetKycReference => {
                let [kyc_id] = expect_args::<1>(operation, args)?;
                encode(&self.kyc.get_reference(stub, kyc_id).await?)
            }
            Operation::ReadKycFormC => {
                let [kyc_id] = expect_args::<1>(operation, args)?;
                self.kyc.read_form_c(stub, kyc_id).await
            }
            Operation::VerifyKycIntegrity => {
                let [kyc_id] = expect_args::<1>(operation, args)?;
                encode(&self.kyc.verify_integrity(stub, kyc_id).await?)
            }
        }
    }
}
