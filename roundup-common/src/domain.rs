use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user enrolled in the round-up program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub active: bool,
    /// Calendar date (YYYY-MM-DD) the scheduler last ran this user through.
    #[serde(rename = "latestRoundupDate", default)]
    pub latest_roundup_date: Option<String>,
    pub pledges: Vec<Pledge>,
    #[serde(rename = "aggregatorTokens", default)]
    pub aggregator_tokens: HashMap<String, String>,
    #[serde(rename = "aggregatorAccounts", default)]
    pub aggregator_accounts: HashMap<String, String>,
}

impl User {
    /// The first active pledge, per §3: "at most one active pledge per
    /// user is observed by the core; if multiple, the first is taken".
    pub fn active_pledge(&self) -> Option<&Pledge> {
        self.pledges.iter().find(|p| p.active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pledge {
    pub active: bool,
    #[serde(rename = "bankId")]
    pub bank_id: String,
    #[serde(rename = "npoId")]
    pub npo_id: String,
    #[serde(rename = "monthlyLimit")]
    pub monthly_limit: Decimal,
    /// Calendar month "YYYY-MM" -> address id.
    pub addresses: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    pub id: String,
    #[serde(rename = "type")]
    pub bank_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressKeys {
    pub public: String,
}

/// A ledger identity to which a chain of round-ups is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    pub keys: AddressKeys,
    #[serde(rename = "latestTransaction", default)]
    pub latest_transaction: Option<String>,
}

/// A raw transaction as returned by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub amount: Decimal,
    pub date: String,
    pub name: String,
    #[serde(default)]
    pub pending: bool,
}

/// Audit copy of an eligible raw transaction, persisted before chain assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaidTransactionRecord {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub amount: Decimal,
    pub roundup: Decimal,
    pub date: String,
    pub name: String,
    pub summed: bool,
}

impl PlaidTransactionRecord {
    pub fn new(transaction_id: String, user_id: String, amount: Decimal, roundup: Decimal, date: String, name: String) -> Self {
        Self {
            transaction_id,
            user_id,
            amount,
            roundup,
            date,
            name,
            summed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainHash {
    #[serde(rename = "type")]
    pub hash_type: String,
    pub value: String,
}

impl ChainHash {
    pub fn sha256(value: String) -> Self {
        Self {
            hash_type: "sha256".to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureHeader {
    pub alg: String,
    pub kid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSignature {
    pub header: SignatureHeader,
    pub signature: String,
}

/// The data covered by a chain entry's hash (invariant 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainPayload {
    pub count: u64,
    pub address: String,
    pub amount: Decimal,
    pub roundup: Decimal,
    pub balance: Decimal,
    pub currency: String,
    pub limit: Decimal,
    pub previous: Option<String>,
    pub timestamp: String,
    pub reference: String,
}

/// One hashed payload plus its signatures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEntry {
    pub hash: ChainHash,
    pub payload: ChainPayload,
    #[serde(default)]
    pub signatures: Vec<ChainSignature>,
}

impl ChainEntry {
    /// A genesis entry: count 0, no previous, zero balance.
    pub fn genesis(address: String, currency: String, limit: Decimal) -> Self {
        let payload = ChainPayload {
            count: 0,
            address,
            amount: Decimal::ZERO,
            roundup: Decimal::ZERO,
            balance: Decimal::ZERO,
            currency,
            limit,
            previous: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            reference: "genesis".to_string(),
        };
        let hash = crate::canonical::canonical_hash(&payload).expect("genesis payload always serializes");
        Self {
            hash: ChainHash::sha256(hash),
            payload,
            signatures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopePayload {
    pub address: String,
    pub previous: ChainEntry,
    pub transactions: Vec<ChainEntry>,
}

/// The object submitted to the signer and drained from the from-signer queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEnvelope {
    pub hash: ChainHash,
    pub payload: EnvelopePayload,
    #[serde(default)]
    pub signatures: Vec<ChainSignature>,
}
