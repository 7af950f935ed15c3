use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use roundup_common::domain::{Address, Bank, ChainEntry, ChainSignature, PlaidTransactionRecord, User};
use roundup_common::Result;

use crate::schema::RunRecord;

/// Persistence boundary for the round-up pipeline. Mirrors the layout
/// in §6 "Persisted state layout": `users.latestRoundupDate`,
/// `addresses.latestTransaction`, a `transactions` collection keyed by
/// `hash.value`, `plaid_transactions` keyed by `transactionId`, and
/// `runs` keyed by `process`.
///
/// A chain-entry write collision on `hash.value` is treated as success
/// (idempotent upsert) per §5 "Shared resources".
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_active_users(&self) -> Result<Vec<User>>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;
    async fn set_latest_roundup_date(&self, user_id: &str, date: &str) -> Result<()>;

    async fn get_address(&self, address: &str) -> Result<Option<Address>>;
    async fn set_latest_transaction(&self, address: &str, hash_value: &str) -> Result<()>;

    async fn get_bank(&self, bank_id: &str) -> Result<Option<Bank>>;

    async fn get_chain_entry(&self, hash_value: &str) -> Result<Option<ChainEntry>>;
    /// Upserts a chain entry by `hash.value`. Returns `true` if this
    /// call inserted a new row, `false` if the hash already existed
    /// (invariant 7: a transaction hash is written at most once).
    async fn upsert_chain_entry(&self, entry: &ChainEntry) -> Result<bool>;
    /// Merges additional signatures onto an already-stored entry,
    /// without disturbing its payload or hash.
    async fn append_signatures(&self, hash_value: &str, signatures: &[ChainSignature]) -> Result<()>;

    /// Inserts a Plaid-transaction audit row. Returns `false` without
    /// writing if `transaction_id` was already recorded (invariant 7).
    async fn insert_plaid_transaction(&self, record: PlaidTransactionRecord) -> Result<bool>;

    async fn record_run(&self, process: &str, last: &str) -> Result<()>;
    async fn get_run(&self, process: &str) -> Result<Option<RunRecord>>;
}

/// In-process store backed by `RwLock<HashMap<..>>`, the way the
/// teacher's `LocalMempool` backs its dev/test mempool — a drop-in
/// stand-in for a real database, sharing the same `Store` contract.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    addresses: RwLock<HashMap<String, Address>>,
    banks: RwLock<HashMap<String, Bank>>,
    transactions: RwLock<HashMap<String, ChainEntry>>,
    plaid_transactions: RwLock<HashMap<String, PlaidTransactionRecord>>,
    runs: RwLock<HashMap<String, RunRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed_user(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn seed_address(&self, address: Address) {
        self.addresses.write().await.insert(address.address.clone(), address);
    }

    pub async fn seed_bank(&self, bank: Bank) {
        self.banks.write().await.insert(bank.id.clone(), bank);
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_active_users(&self) -> Result<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.active && u.active_pledge().is_some())
            .cloned()
            .collect())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn set_latest_roundup_date(&self, user_id: &str, date: &str) -> Result<()> {
        if let Some(user) = self.users.write().await.get_mut(user_id) {
            user.latest_roundup_date = Some(date.to_string());
        }
        Ok(())
    }

    async fn get_address(&self, address: &str) -> Result<Option<Address>> {
        Ok(self.addresses.read().await.get(address).cloned())
    }

    async fn set_latest_transaction(&self, address: &str, hash_value: &str) -> Result<()> {
        if let Some(addr) = self.addresses.write().await.get_mut(address) {
            addr.latest_transaction = Some(hash_value.to_string());
        }
        Ok(())
    }

    async fn get_bank(&self, bank_id: &str) -> Result<Option<Bank>> {
        Ok(self.banks.read().await.get(bank_id).cloned())
    }

    async fn get_chain_entry(&self, hash_value: &str) -> Result<Option<ChainEntry>> {
        Ok(self.transactions.read().await.get(hash_value).cloned())
    }

    async fn upsert_chain_entry(&self, entry: &ChainEntry) -> Result<bool> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&entry.hash.value) {
            return Ok(false);
        }
        transactions.insert(entry.hash.value.clone(), entry.clone());
        Ok(true)
    }

    async fn append_signatures(&self, hash_value: &str, signatures: &[ChainSignature]) -> Result<()> {
        if let Some(entry) = self.transactions.write().await.get_mut(hash_value) {
            entry.signatures.extend_from_slice(signatures);
        }
        Ok(())
    }

    async fn insert_plaid_transaction(&self, record: PlaidTransactionRecord) -> Result<bool> {
        let mut plaid_transactions = self.plaid_transactions.write().await;
        if plaid_transactions.contains_key(&record.transaction_id) {
            return Ok(false);
        }
        plaid_transactions.insert(record.transaction_id.clone(), record);
        Ok(true)
    }

    async fn record_run(&self, process: &str, last: &str) -> Result<()> {
        self.runs.write().await.insert(
            process.to_string(),
            RunRecord {
                process: process.to_string(),
                last: last.to_string(),
            },
        );
        Ok(())
    }

    async fn get_run(&self, process: &str) -> Result<Option<RunRecord>> {
        Ok(self.runs.read().await.get(process).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundup_common::domain::{AddressKeys, ChainHash, ChainPayload};
    use rust_decimal_macros::dec;

    fn entry(hash: &str, count: u64) -> ChainEntry {
        ChainEntry {
            hash: ChainHash::sha256(hash.to_string()),
            payload: ChainPayload {
                count,
                address: "addr-1".to_string(),
                amount: dec!(1.00),
                roundup: dec!(0.00),
                balance: dec!(0.00),
                currency: "USD".to_string(),
                limit: dec!(-10),
                previous: None,
                timestamp: "2026-01-01".to_string(),
                reference: "tx-1".to_string(),
            },
            signatures: Vec::new(),
        }
    }

    #[tokio::test]
    async fn upsert_chain_entry_is_idempotent_on_hash() {
        let store = InMemoryStore::new();
        let e = entry("hash-1", 1);

        assert!(store.upsert_chain_entry(&e).await.unwrap());
        assert!(!store.upsert_chain_entry(&e).await.unwrap());
        assert!(store.get_chain_entry("hash-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn plaid_transaction_is_written_at_most_once() {
        let store = InMemoryStore::new();
        let record = PlaidTransactionRecord::new(
            "tx-1".to_string(),
            "user-1".to_string(),
            dec!(1.23),
            dec!(0.77),
            "2026-01-01".to_string(),
            "merchant".to_string(),
        );

        assert!(store.insert_plaid_transaction(record.clone()).await.unwrap());
        assert!(!store.insert_plaid_transaction(record).await.unwrap());
    }

    #[tokio::test]
    async fn address_latest_transaction_only_advances_via_explicit_update() {
        let store = InMemoryStore::new();
        store
            .seed_address(Address {
                address: "addr-1".to_string(),
                keys: AddressKeys { public: "pub".to_string() },
                latest_transaction: None,
            })
            .await;

        store.set_latest_transaction("addr-1", "hash-1").await.unwrap();
        let addr = store.get_address("addr-1").await.unwrap().unwrap();
        assert_eq!(addr.latest_transaction, Some("hash-1".to_string()));
    }
}
