use aws_sdk_sqs::Client;
use roundup_common::{Result, RoundupError};

/// One message drained from the from-signer queue, plus the receipt
/// handle needed to permanently delete it after a successful commit.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub body: String,
    pub receipt_handle: String,
}

/// Long-polls the from-signer queue and exposes explicit, per-message delete.
#[derive(Debug, Clone)]
pub struct InboundQueue {
    client: Client,
    queue_url: String,
    wait_time_seconds: i32,
    max_messages: i32,
}

impl InboundQueue {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self {
            client,
            queue_url,
            wait_time_seconds: 20,
            max_messages: 10,
        }
    }

    /// Long-polls up to the configured wait cap; returns 0..N messages.
    pub async fn receive(&self) -> Result<Vec<InboundMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .wait_time_seconds(self.wait_time_seconds)
            .max_number_of_messages(self.max_messages)
            .send()
            .await
            .map_err(|e| RoundupError::QueueReceiveError(e.to_string()))?;

        let messages = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                Some(InboundMessage {
                    body: m.body?,
                    receipt_handle: m.receipt_handle?,
                })
            })
            .collect();

        Ok(messages)
    }

    /// Permanently removes a message. Only called after a successful commit.
    pub async fn delete_message(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| RoundupError::QueueSendError(e.to_string()))?;

        Ok(())
    }
}
