use serde::{Deserialize, Serialize};

/// A run record, keyed by `process` (`runs` collection in §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub process: String,
    pub last: String,
}
