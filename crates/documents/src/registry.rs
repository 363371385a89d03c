//! Document registry operations

use std::sync::Arc;

use iu_core::{
    decode, encode, require_non_empty, AccessPolicy, ContractError, ContractResult, Document,
    DocumentStatus, DocumentVerification, Entity, Operation,
};
use iu_state::{ChaincodeStub, Selector};

/// Unparsed arguments of `SubmitLoanDocument`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSubmission {
    pub loan_id: String,
    pub doc_id: String,
    pub hash: String,
    pub doc_type: String,
    pub mime: String,
    /// Byte size as text; empty means 0
    pub size: String,
    pub metadata: String,
}

/// Parse a document size, treating empty input as 0
fn parse_size(size: &str) -> ContractResult<u64> {
    if size.is_empty() {
        return Ok(0);
    }
    size.parse()
        .map_err(|e| ContractError::validation(format!("invalid size {:?}: {}", size, e)))
}

/// Loan document registry
pub struct DocumentRegistry {
    policy: Arc<dyn AccessPolicy>,
}

impl DocumentRegistry {
    pub fn new(policy: Arc<dyn AccessPolicy>) -> Self {
        Self { policy }
    }

    /// Register a document's metadata and digest under `DOC_<docId>`
    pub async fn submit(
        &self,
        stub: &dyn ChaincodeStub,
        submission: &DocumentSubmission,
    ) -> ContractResult<Document> {
        require_non_empty(&[
            ("loanId", submission.loan_id.as_str()),
            ("docId", submission.doc_id.as_str()),
            ("hash", submission.hash.as_str()),
        ])?;
        let size = parse_size(&submission.size)?;
        let owner_org = stub.creator_msp_id()?;

        let key = Document::key_for(&submission.doc_id);
        if stub.get_state(&key).await?.is_some() {
            return Err(ContractError::already_exists(Document::KIND, &submission.doc_id));
        }

        let doc = Document {
            doc_id: submission.doc_id.clone(),
            loan_id: submission.loan_id.clone(),
            hash: submission.hash.clone(),
            doc_type: submission.doc_type.clone(),
            mime: submission.mime.clone(),
            size,
            owner_org,
            uploaded_at: stub.tx_timestamp(),
            status: DocumentStatus::Submitted,
            metadata: submission.metadata.clone(),
        };

        let bytes = encode(&doc)?;
        stub.put_state(&key, bytes.clone()).await?;
        stub.set_event("DOC_SUBMITTED", bytes)?;

        tracing::info!(
            doc_id = %doc.doc_id,
            loan_id = %doc.loan_id,
            owner = %doc.owner_org,
            "Document submitted"
        );
        Ok(doc)
    }

    pub async fn get(&self, stub: &dyn ChaincodeStub, doc_id: &str) -> ContractResult<Document> {
        require_non_empty(&[("docId", doc_id)])?;
        let bytes = stub
            .get_state(&Document::key_for(doc_id))
            .await?
            .ok_or_else(|| ContractError::not_found(Document::KIND, doc_id))?;
        decode(&bytes)
    }

    /// Documents of one loan, ordered by upload time then id
    pub async fn loan_documents(
        &self,
        stub: &dyn ChaincodeStub,
        loan_id: &str,
    ) -> ContractResult<Vec<Document>> {
        require_non_empty(&[("loanId", loan_id)])?;

        let selector = Selector::new().eq("loanId", loan_id);
        tracing::debug!(query = %selector.to_query_string(), "Listing loan documents");

        let mut docs: Vec<Document> = stub
            .get_query_result(&selector)
            .await?
            .iter()
            .filter_map(|kv| decode::<Document>(&kv.value).ok())
            .filter(|doc| !doc.doc_id.is_empty())
            .collect();

        docs.sort_by(|a, b| {
            a.uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        Ok(docs)
    }

    /// Compare a caller-computed digest against the registered one
    pub async fn verify_hash(
        &self,
        stub: &dyn ChaincodeStub,
        doc_id: &str,
        provided_hash: &str,
    ) -> ContractResult<DocumentVerification> {
        let doc = self.get(stub, doc_id).await?;
        let is_valid = doc.hash.eq_ignore_ascii_case(provided_hash.trim());

        Ok(DocumentVerification {
            doc_id: doc.doc_id,
            loan_id: doc.loan_id,
            is_valid,
            stored_hash: doc.hash,
            provided_hash: provided_hash.to_string(),
            verified_at: stub.tx_timestamp(),
        })
    }

    /// Decide a SUBMITTED document (privileged)
    pub async fn review(
        &self,
        stub: &dyn ChaincodeStub,
        doc_id: &str,
        verified: bool,
    ) -> ContractResult<Document> {
        let identity = stub.creator_msp_id()?;
        self.policy.authorize(&identity, Operation::ReviewDocument)?;

        let mut doc = self.get(stub, doc_id).await?;
        if doc.status != DocumentStatus::Submitted {
            return Err(ContractError::invalid_state(format!(
                "document {} already {}",
                doc_id, doc.status
            )));
        }

        doc.status = if verified {
            DocumentStatus::Verified
        } else {
            DocumentStatus::Rejected
        };

        let bytes = encode(&doc)?;
        stub.put_state(&doc.state_key(), bytes.clone()).await?;
        stub.set_event("DOC_REVIEWED", bytes)?;

        tracing::info!(
            doc_id = %doc_id,
            status = %doc.status,
            reviewer = %identity,
            "Document reviewed"
        );
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use iu_core::{RolePolicy, UtilityConfig};
    use iu_state::{Ledger, Transient};

    fn registry() -> DocumentRegistry {
        DocumentRegistry::new(Arc::new(RolePolicy::from_config(&UtilityConfig::default())))
    }

    fn submission(loan_id: &str, doc_id: &str) -> DocumentSubmission {
        DocumentSubmission {
            loan_id: loan_id.to_string(),
            doc_id: doc_id.to_string(),
            hash: "ab".repeat(32),
            doc_type: "SANCTION_LETTER".to_string(),
            mime: "application/pdf".to_string(),
            size: "2048".to_string(),
            metadata: String::new(),
        }
    }

    async fn submit_at(ledger: &Ledger, sub: DocumentSubmission, seconds: i64) -> Document {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(seconds);
        let stub = ledger.begin_at("CreditorMSP", Transient::new(), ts);
        let doc = registry().submit(&stub, &sub).await.unwrap();
        stub.commit().unwrap();
        doc
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("").unwrap(), 0);
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert!(matches!(parse_size("abc"), Err(ContractError::Validation(_))));
        assert!(parse_size("-1").is_err());
    }

    #[tokio::test]
    async fn test_submit_and_get() {
        let ledger = Ledger::in_memory();
        let doc = submit_at(&ledger, submission("L1", "D1"), 0).await;

        assert_eq!(doc.owner_org, "CreditorMSP");
        assert_eq!(doc.size, 2048);
        assert_eq!(doc.status, DocumentStatus::Submitted);

        let stub = ledger.begin("DebtorMSP", Transient::new());
        assert_eq!(registry().get(&stub, "D1").await.unwrap(), doc);
        assert!(ledger.get("DOC_D1").unwrap().is_some());

        let events = ledger.events().unwrap();
        assert_eq!(events[0].name, "DOC_SUBMITTED");
        let emitted: Document = decode(&events[0].payload).unwrap();
        assert_eq!(emitted, doc);
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let ledger = Ledger::in_memory();
        let stub = ledger.begin("CreditorMSP", Transient::new());

        let mut bad = submission("L1", "D1");
        bad.hash = String::new();
        assert!(matches!(
            registry().submit(&stub, &bad).await,
            Err(ContractError::Validation(_))
        ));

        bad = submission("L1", "D1");
        bad.size = "abc".to_string();
        assert!(matches!(
            registry().submit(&stub, &bad).await,
            Err(ContractError::Validation(_))
        ));

        let mut empty_size = submission("L1", "D1");
        empty_size.size = String::new();
        assert_eq!(registry().submit(&stub, &empty_size).await.unwrap().size, 0);
    }

    #[tokio::test]
    async fn test_duplicate_doc_rejected() {
        let ledger = Ledger::in_memory();
        submit_at(&ledger, submission("L1", "D1"), 0).await;

        let stub = ledger.begin("DebtorMSP", Transient::new());
        let result = registry().submit(&stub, &submission("L2", "D1")).await;
        assert!(matches!(result, Err(ContractError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_loan_documents_ordered() {
        let ledger = Ledger::in_memory();
        submit_at(&ledger, submission("L1", "D3"), 10).await;
        submit_at(&ledger, submission("L1", "D2"), 0).await;
        submit_at(&ledger, submission("L1", "D1"), 10).await;
        submit_at(&ledger, submission("L2", "D9"), 5).await;

        let stub = ledger.begin("CreditorMSP", Transient::new());
        let docs = registry().loan_documents(&stub, "L1").await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["D2", "D1", "D3"]);
    }

    #[tokio::test]
    async fn test_verify_hash() {
        let ledger = Ledger::in_memory();
        submit_at(&ledger, submission("L1", "D1"), 0).await;

        let stub = ledger.begin("AuditorMSP", Transient::new());
        let ok = registry()
            .verify_hash(&stub, "D1", &"AB".repeat(32))
            .await
            .unwrap();
        assert!(ok.is_valid);

        let bad = registry().verify_hash(&stub, "D1", "deadbeef").await.unwrap();
        assert!(!bad.is_valid);
        assert_eq!(bad.stored_hash, "ab".repeat(32));

        assert!(matches!(
            registry().verify_hash(&stub, "NOPE", "x").await,
            Err(ContractError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_review_is_privileged_and_once() {
        let ledger = Ledger::in_memory();
        submit_at(&ledger, submission("L1", "D1"), 0).await;

        let stub = ledger.begin("CreditorMSP", Transient::new());
        assert!(matches!(
            registry().review(&stub, "D1", true).await,
            Err(ContractError::Unauthorized(_))
        ));
        drop(stub);

        let stub = ledger.begin("AdminMSP", Transient::new());
        let doc = registry().review(&stub, "D1", false).await.unwrap();
        assert_eq!(doc.status, DocumentStatus::Rejected);
        stub.commit().unwrap();

        let stub = ledger.begin("AdminMSP", Transient::new());
        assert!(matches!(
            registry().review(&stub, "D1", true).await,
            Err(ContractError::InvalidState(_))
        ));
        assert_eq!(ledger.events().unwrap().last().unwrap().name, "DOC_REVIEWED");
    }
}
