//! Ledger bootstrap - genesis seed accounts

use iu_core::{
    encode, Account, AccountStatus, AccountType, Amount, ContractResult, Currency, Entity,
};
use iu_state::ChaincodeStub;

/// Seed accounts as (id, owner, balance, type)
const SEED_ACCOUNTS: [(&str, &str, &str, AccountType); 3] = [
    ("ACC001", "CREDITOR001", "1000000.00", AccountType::Creditor),
    ("ACC002", "DEBTOR001", "500000.00", AccountType::Debtor),
    ("ACC003", "ADMIN001", "0.00", AccountType::Admin),
];

/// Write the seed accounts, overwriting whatever is stored under their ids
///
/// Intended for genesis only; running it again resets the balances.
pub async fn init_ledger(stub: &dyn ChaincodeStub) -> ContractResult<Vec<Account>> {
    let now = stub.tx_timestamp();
    let mut accounts = Vec::with_capacity(SEED_ACCOUNTS.len());

    for (id, owner, balance, account_type) in SEED_ACCOUNTS {
        let balance: Amount = balance.parse()?;
        let account = Account {
            id: id.to_string(),
            owner_id: owner.to_string(),
            balance,
            currency: Currency::Usd,
            account_type,
            status: AccountStatus::Active,
            created_at: now,
            last_updated: now,
        };

        stub.put_state(&account.state_key(), encode(&account)?).await?;
        accounts.push(account);
    }

    tracing::info!(accounts = accounts.len(), "Ledger initialized with seed accounts");
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iu_core::decode;
    use iu_state::{Ledger, Transient};

    #[tokio::test]
    async fn test_seed_accounts() {
        let ledger = Ledger::in_memory();
        let stub = ledger.begin("AdminMSP", Transient::new());
        init_ledger(&stub).await.unwrap();
        stub.commit().unwrap();

        let bytes = ledger.get("ACC001").unwrap().unwrap();
        let creditor: Account = decode(&bytes).unwrap();
        assert_eq!(creditor.owner_id, "CREDITOR001");
        assert_eq!(creditor.balance.to_string(), "1000000.00");
        assert_eq!(creditor.account_type, AccountType::Creditor);

        let admin: Account = decode(&ledger.get("ACC003").unwrap().unwrap()).unwrap();
        assert!(admin.balance.is_zero());
        assert_eq!(admin.status, AccountStatus::Active);
        assert_eq!(ledger.keys().unwrap(), vec!["ACC001", "ACC002", "ACC003"]);
    }

    #[tokio::test]
    async fn test_rerun_overwrites() {
        let ledger = Ledger::in_memory();

        let stub = ledger.begin("AdminMSP", Transient::new());
        stub.put_state("ACC002", b"{\"stale\":true}".to_vec()).await.unwrap();
        stub.commit().unwrap();

        let stub = ledger.begin("AdminMSP", Transient::new());
        init_ledger(&stub).await.unwrap();
        stub.commit().unwrap();

        let debtor: Account = decode(&ledger.get("ACC002").unwrap().unwrap()).unwrap();
        assert_eq!(debtor.balance.to_string(), "500000.00");
    }
}
