use std::sync::Arc;

use tracing::{error, info, warn};

use roundup_chain::verifier;
use roundup_common::domain::ChainEnvelope;
use roundup_common::Result;
use roundup_queue::{InboundMessage, InboundQueue};
use roundup_store::Store;

/// Drains the from-signer queue, verifies, and commits chains (C10).
///
/// Single-flight by construction: `run` processes messages one at a
/// time, in receive order, and only deletes a message after a
/// successful commit (§5 "parallelizing this is forbidden until
/// per-address ordering is enforced").
pub struct Consumer {
    store: Arc<dyn Store>,
    inbound: InboundQueue,
    server_public_key: String,
    empty_poll_limit: u32,
}

impl Consumer {
    pub fn new(store: Arc<dyn Store>, inbound: InboundQueue, server_public_key: String, empty_poll_limit: u32) -> Self {
        Self {
            store,
            inbound,
            server_public_key,
            empty_poll_limit: empty_poll_limit.max(1),
        }
    }

    /// Runs the Polling/Processing state machine until `emptyCount`
    /// reaches the configured limit, then writes a run record.
    pub async fn run(&self) -> Result<()> {
        let mut empty_count = 0u32;

        loop {
            let messages = self.inbound.receive().await?;

            if messages.is_empty() {
                empty_count += 1;
                info!(target: "roundup_core::consumer", empty_count, "empty poll");
                if empty_count >= self.empty_poll_limit {
                    break;
                }
                continue;
            }

            empty_count = 0;
            for message in messages {
                self.process(&message).await;
            }
        }

        self.store.record_run("consumer", &roundup_common::time::today()).await?;
        info!(target: "roundup_core::consumer", "terminating after sustained emptiness");
        Ok(())
    }

    /// Processes one raw queue message: parse, commit, delete. Parse
    /// failures are logged and the receipt is left alone so redelivery
    /// (or eventual dead-lettering) can handle it.
    async fn process(&self, message: &InboundMessage) {
        let envelope: ChainEnvelope = match serde_json::from_str(&message.body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(target: "roundup_core::consumer", error = %e, "dropping receipt of a message that failed to parse");
                return;
            }
        };

        match self.commit(&envelope).await {
            Ok(()) => {
                if let Err(e) = self.inbound.delete_message(&message.receipt_handle).await {
                    error!(target: "roundup_core::consumer", error = %e, "failed to delete message after successful commit");
                }
            }
            Err(e) => {
                error!(target: "roundup_core::consumer", address = %envelope.payload.address, error = %e, "commit failed, leaving message for redelivery");
            }
        }
    }

    /// The commit protocol for one envelope (§4.10).
    async fn commit(&self, envelope: &ChainEnvelope) -> Result<()> {
        let address = self
            .store
            .get_address(&envelope.payload.address)
            .await?
            .ok_or_else(|| roundup_common::RoundupError::AddressNotFound(envelope.payload.address.clone()))?;

        if !verifier::verify(envelope, &self.server_public_key) {
            return Err(roundup_common::RoundupError::SignatureForAwsMessageIncorrect(
                envelope.payload.address.clone(),
            ));
        }

        let previous_count = envelope.payload.previous.payload.count;
        let expected_latest_count = previous_count + envelope.payload.transactions.len() as u64;

        for entry in &envelope.payload.transactions {
            self.store.upsert_chain_entry(entry).await?;
        }

        let latest = envelope
            .payload
            .transactions
            .iter()
            .find(|entry| entry.payload.count == expected_latest_count)
            .ok_or_else(|| roundup_common::RoundupError::NoTransactionChain(envelope.payload.address.clone()))?;

        let last_signature = latest
            .signatures
            .last()
            .ok_or_else(|| roundup_common::RoundupError::SignatureForLastTransactionIncorrect(latest.hash.value.clone()))?;

        let payload_hash = roundup_common::canonical::canonical_hash(&latest.payload)?;
        let verified = roundup_common::auth::verify_with_key_hex(
            payload_hash.as_bytes(),
            &last_signature.signature,
            &address.keys.public,
        );

        if !verified {
            return Err(roundup_common::RoundupError::SignatureForLastTransactionIncorrect(
                latest.hash.value.clone(),
            ));
        }

        self.store
            .set_latest_transaction(&envelope.payload.address, &latest.hash.value)
            .await?;

        Ok(())
    }
}
