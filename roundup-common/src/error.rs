use thiserror::Error;

/// Error taxonomy for the round-up pipeline.
///
/// Variants are grouped the way the design's disposition table groups
/// them: data-level, corruption/drift, configuration, transient,
/// cryptographic, and malformed-message. The disposition itself (abort
/// this user vs. drop this message vs. alert) is decided by callers,
/// not by this enum.
#[derive(Debug, Error)]
pub enum RoundupError {
    #[error("invalid-amount: {0}")]
    InvalidAmount(String),

    #[error("invalid-transaction-input: {0}")]
    InvalidTransactionInput(String),

    #[error("invalid-transaction-amount: {0}")]
    InvalidTransactionAmount(String),

    #[error("invalid-transaction-roundup: {0}")]
    InvalidTransactionRoundup(String),

    #[error("address-mismatch: {0}")]
    AddressMismatch(String),

    #[error("invalid-previous-transaction: {0}")]
    InvalidPreviousTransaction(String),

    #[error("previous-transaction-hash-mismatch: {0}")]
    PreviousTransactionHashMismatch(String),

    #[error("no-previous-chain: {0}")]
    NoPreviousChain(String),

    #[error("address-not-found: {0}")]
    AddressNotFound(String),

    #[error("aggregator-http-error: {0}")]
    AggregatorHttpError(String),

    #[error("signer-http-error: {0}")]
    SignerHttpError(String),

    #[error("queue-send-error: {0}")]
    QueueSendError(String),

    #[error("queue-receive-error: {0}")]
    QueueReceiveError(String),

    #[error("invalid-signature: {0}")]
    InvalidSignature(String),

    #[error("signature-for-aws-message-is-incorrect: {0}")]
    SignatureForAwsMessageIncorrect(String),

    #[error("signature-for-last-transaction-is-incorrect: {0}")]
    SignatureForLastTransactionIncorrect(String),

    #[error("no-transaction-chain: {0}")]
    NoTransactionChain(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RoundupError>;
