use aws_sdk_sqs::Client;
use roundup_common::canonical::canonical_json;
use roundup_common::domain::ChainEnvelope;
use roundup_common::{Result, RoundupError};

/// Delivers signed envelopes to the to-signer queue. At-least-once
/// delivery is assumed upstream; idempotency on the receiving side
/// relies on `hash.value` uniqueness, not on queue semantics.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    client: Client,
    queue_url: String,
}

impl OutboundQueue {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }

    /// Serializes `envelope` as canonical JSON and enqueues it.
    pub async fn send(&self, envelope: &ChainEnvelope) -> Result<()> {
        let body = canonical_json(envelope)?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| RoundupError::QueueSendError(e.to_string()))?;

        Ok(())
    }
}
