use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};

use roundup_common::domain::{Address, Bank, ChainEntry, ChainSignature, PlaidTransactionRecord, User};
use roundup_common::{Result, RoundupError};

use crate::schema::RunRecord;
use crate::store::Store;

const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const ADDRESSES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("addresses");
const BANKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("banks");
const TRANSACTIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");
const PLAID_TRANSACTIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("plaid_transactions");
const RUNS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("runs");

fn db_err(e: impl std::fmt::Display) -> RoundupError {
    RoundupError::Storage(e.to_string())
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RoundupError::Storage(format!("blocking storage task panicked: {e}")))?
}

fn read_json<T: serde::de::DeserializeOwned>(
    db: &Database,
    table: TableDefinition<&str, &[u8]>,
    key: &str,
) -> Result<Option<T>> {
    let read_txn = db.begin_read().map_err(db_err)?;
    let table = read_txn.open_table(table).map_err(db_err)?;
    match table.get(key).map_err(db_err)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value()).map_err(db_err)?)),
        None => Ok(None),
    }
}

fn write_json<T: serde::Serialize>(
    db: &Database,
    table: TableDefinition<&str, &[u8]>,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value).map_err(db_err)?;
    let write_txn = db.begin_write().map_err(db_err)?;
    {
        let mut table = write_txn.open_table(table).map_err(db_err)?;
        table.insert(key, bytes.as_slice()).map_err(db_err)?;
    }
    write_txn.commit().map_err(db_err)?;
    Ok(())
}

/// File-backed `Store` implementation: one `redb` database per process,
/// one table per collection in §6's "Persisted state layout", JSON-encoded
/// values keyed by each entity's natural key. Grounded on the teacher's
/// own `atlas-ledger::core::runtime::Index` (`redb::Database` +
/// `TableDefinition` per collection, idempotent insert by checking
/// existence inside the write transaction before inserting).
///
/// `redb`'s transactions are synchronous; every `Store` method here hands
/// the actual read/write to a blocking thread via `spawn_blocking` so the
/// async runtime's worker threads are never held across file I/O.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Opens (creating if absent) `roundup.redb` under `data_dir`,
    /// initializing every collection's table.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Arc<Self>> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(db_err)?;
        let path = data_dir.join("roundup.redb");

        let db = Database::create(path).map_err(db_err)?;
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            write_txn.open_table(USERS_TABLE).map_err(db_err)?;
            write_txn.open_table(ADDRESSES_TABLE).map_err(db_err)?;
            write_txn.open_table(BANKS_TABLE).map_err(db_err)?;
            write_txn.open_table(TRANSACTIONS_TABLE).map_err(db_err)?;
            write_txn.open_table(PLAID_TRANSACTIONS_TABLE).map_err(db_err)?;
            write_txn.open_table(RUNS_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(Arc::new(Self { db: Arc::new(db) }))
    }

    /// Seeds a user row directly, bypassing the `Store` trait's
    /// async/blocking split. Used by setup tooling and tests that need a
    /// synchronous fixture.
    pub fn seed_user_sync(&self, user: &User) -> Result<()> {
        write_json(&self.db, USERS_TABLE, &user.id, user)
    }

    pub fn seed_address_sync(&self, address: &Address) -> Result<()> {
        write_json(&self.db, ADDRESSES_TABLE, &address.address, address)
    }

    pub fn seed_bank_sync(&self, bank: &Bank) -> Result<()> {
        write_json(&self.db, BANKS_TABLE, &bank.id, bank)
    }
}

#[async_trait]
impl Store for RedbStore {
    async fn list_active_users(&self) -> Result<Vec<User>> {
        let db = Arc::clone(&self.db);
        blocking(move || {
            let read_txn = db.begin_read().map_err(db_err)?;
            let table = read_txn.open_table(USERS_TABLE).map_err(db_err)?;
            let mut users = Vec::new();
            for row in table.iter().map_err(db_err)? {
                let (_, value) = row.map_err(db_err)?;
                let user: User = serde_json::from_slice(value.value()).map_err(db_err)?;
                if user.active && user.active_pledge().is_some() {
                    users.push(user);
                }
            }
            Ok(users)
        })
        .await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        blocking(move || read_json(&db, USERS_TABLE, &user_id)).await
    }

    async fn set_latest_roundup_date(&self, user_id: &str, date: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let date = date.to_string();
        blocking(move || {
            if let Some(mut user) = read_json::<User>(&db, USERS_TABLE, &user_id)? {
                user.latest_roundup_date = Some(date);
                write_json(&db, USERS_TABLE, &user_id, &user)?;
            }
            Ok(())
        })
        .await
    }

    async fn get_address(&self, address: &str) -> Result<Option<Address>> {
        let db = Arc::clone(&self.db);
        let address = address.to_string();
        blocking(move || read_json(&db, ADDRESSES_TABLE, &address)).await
    }

    async fn set_latest_transaction(&self, address: &str, hash_value: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let address = address.to_string();
        let hash_value = hash_value.to_string();
        blocking(move || {
            if let Some(mut addr) = read_json::<Address>(&db, ADDRESSES_TABLE, &address)? {
                addr.latest_transaction = Some(hash_value);
                write_json(&db, ADDRESSES_TABLE, &address, &addr)?;
            }
            Ok(())
        })
        .await
    }

    async fn get_bank(&self, bank_id: &str) -> Result<Option<Bank>> {
        let db = Arc::clone(&self.db);
        let bank_id = bank_id.to_string();
        blocking(move || read_json(&db, BANKS_TABLE, &bank_id)).await
    }

    async fn get_chain_entry(&self, hash_value: &str) -> Result<Option<ChainEntry>> {
        let db = Arc::clone(&self.db);
        let hash_value = hash_value.to_string();
        blocking(move || read_json(&db, TRANSACTIONS_TABLE, &hash_value)).await
    }

    async fn upsert_chain_entry(&self, entry: &ChainEntry) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let entry = entry.clone();
        blocking(move || {
            let write_txn = db.begin_write().map_err(db_err)?;
            let inserted = {
                let mut table = write_txn.open_table(TRANSACTIONS_TABLE).map_err(db_err)?;
                if table.get(entry.hash.value.as_str()).map_err(db_err)?.is_some() {
                    false
                } else {
                    let bytes = serde_json::to_vec(&entry).map_err(db_err)?;
                    table.insert(entry.hash.value.as_str(), bytes.as_slice()).map_err(db_err)?;
                    true
                }
            };
            write_txn.commit().map_err(db_err)?;
            Ok(inserted)
        })
        .await
    }

    async fn append_signatures(&self, hash_value: &str, signatures: &[ChainSignature]) -> Result<()> {
        let db = Arc::clone(&self.db);
        let hash_value = hash_value.to_string();
        let signatures = signatures.to_vec();
        blocking(move || {
            if let Some(mut entry) = read_json::<ChainEntry>(&db, TRANSACTIONS_TABLE, &hash_value)? {
                entry.signatures.extend(signatures);
                write_json(&db, TRANSACTIONS_TABLE, &hash_value, &entry)?;
            }
            Ok(())
        })
        .await
    }

    async fn insert_plaid_transaction(&self, record: PlaidTransactionRecord) -> Result<bool> {
        let db = Arc::clone(&self.db);
        blocking(move || {
            let write_txn = db.begin_write().map_err(db_err)?;
            let inserted = {
                let mut table = write_txn.open_table(PLAID_TRANSACTIONS_TABLE).map_err(db_err)?;
                if table.get(record.transaction_id.as_str()).map_err(db_err)?.is_some() {
                    false
                } else {
                    let bytes = serde_json::to_vec(&record).map_err(db_err)?;
                    table
                        .insert(record.transaction_id.as_str(), bytes.as_slice())
                        .map_err(db_err)?;
                    true
                }
            };
            write_txn.commit().map_err(db_err)?;
            Ok(inserted)
        })
        .await
    }

    async fn record_run(&self, process: &str, last: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let process = process.to_string();
        let record = RunRecord {
            process: process.clone(),
            last: last.to_string(),
        };
        blocking(move || write_json(&db, RUNS_TABLE, &process, &record)).await
    }

    async fn get_run(&self, process: &str) -> Result<Option<RunRecord>> {
        let db = Arc::clone(&self.db);
        let process = process.to_string();
        blocking(move || read_json(&db, RUNS_TABLE, &process)).await
    }
}
