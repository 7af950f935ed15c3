pub mod redb_store;
pub mod schema;
pub mod store;

pub use redb_store::RedbStore;
pub use schema::RunRecord;
pub use store::{InMemoryStore, Store};
