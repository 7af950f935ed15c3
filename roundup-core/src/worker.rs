use std::sync::Arc;

use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use roundup_aggregator::{AggregatorClient, DateRange};
use roundup_chain::{builder, signer as chain_signer};
use roundup_common::auth::Signer;
use roundup_common::domain::{ChainEnvelope, EnvelopePayload, PlaidTransactionRecord};
use roundup_common::filter::filter_eligible;
use roundup_common::money::roundup;
use roundup_common::RoundupError;
use roundup_queue::OutboundQueue;
use roundup_store::Store;

/// One user's unit of work, assembled by the scheduler (C9).
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub user_id: String,
    pub address: String,
    pub aggregator_token: String,
    pub monthly_limit: Decimal,
    pub bank_type: String,
    pub date_range: DateRange,
}

/// The outcome of running one user through the intake worker.
/// `Enqueued` is the only outcome that should advance `latestRoundupDate`.
#[derive(Debug)]
pub enum WorkOutcome {
    Enqueued,
    Skipped(String),
    Failed(RoundupError),
}

/// Fetches one user's recent transactions, filters, builds the chain,
/// signs, and enqueues it for co-signing (C8). On any failure this
/// returns `Failed` rather than propagating — per §4.8, a worker "logs
/// and signals ready"; it never aborts the scheduler and never retries
/// within this run.
pub struct IntakeWorker {
    store: Arc<dyn Store>,
    aggregator: AggregatorClient,
    outbound: OutboundQueue,
    signer: Arc<dyn Signer>,
    server_kid: String,
    http: Client,
    signer_trigger_url: String,
}

impl IntakeWorker {
    pub fn new(
        store: Arc<dyn Store>,
        aggregator: AggregatorClient,
        outbound: OutboundQueue,
        signer: Arc<dyn Signer>,
        server_kid: String,
        signer_trigger_url: String,
    ) -> Self {
        Self {
            store,
            aggregator,
            outbound,
            signer,
            server_kid,
            http: Client::new(),
            signer_trigger_url,
        }
    }

    pub async fn run(&self, item: WorkItem) -> WorkOutcome {
        match self.try_run(&item).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(target: "roundup_core::worker", user_id = %item.user_id, error = %e, "intake worker failed");
                WorkOutcome::Failed(e)
            }
        }
    }

    async fn try_run(&self, item: &WorkItem) -> Result<WorkOutcome, RoundupError> {
        // 1. Fetch raw transactions.
        let raw = self
            .aggregator
            .fetch_transactions(&item.aggregator_token, &item.date_range)
            .await?;

        // 2. Filter, compute round-ups, persist audit rows (best-effort).
        let eligible = filter_eligible(raw);
        if eligible.is_empty() {
            info!(target: "roundup_core::worker", user_id = %item.user_id, "no eligible transactions, skipping");
            return Ok(WorkOutcome::Skipped("no-eligible-transactions".to_string()));
        }

        for tx in &eligible {
            let tx_roundup = roundup(tx.amount);
            let record = PlaidTransactionRecord::new(
                tx.id.clone(),
                item.user_id.clone(),
                tx.amount,
                tx_roundup,
                tx.date.clone(),
                tx.name.clone(),
            );
            if let Err(e) = self.store.insert_plaid_transaction(record).await {
                warn!(target: "roundup_core::worker", user_id = %item.user_id, tx_id = %tx.id, error = %e, "failed to persist plaid transaction record");
            }
        }

        // 3. Fetch the previous chain tip.
        let address = self
            .store
            .get_address(&item.address)
            .await?
            .ok_or_else(|| RoundupError::AddressNotFound(item.address.clone()))?;

        let previous_hash = address
            .latest_transaction
            .clone()
            .ok_or_else(|| RoundupError::NoPreviousChain(item.address.clone()))?;

        let previous = self
            .store
            .get_chain_entry(&previous_hash)
            .await?
            .ok_or_else(|| RoundupError::NoPreviousChain(previous_hash.clone()))?;

        // 4. Build the new entries.
        let entries = builder::build(&item.address, &previous, &eligible)?;
        if entries.is_empty() {
            return Ok(WorkOutcome::Skipped("builder-produced-no-entries".to_string()));
        }

        // Open question (a): the builder does not reject a batch whose
        // cumulative balance crosses `limit` — policy is external. We
        // surface it as a warning rather than silently ignoring it.
        if let Some(last) = entries.last() {
            if last.payload.balance < item.monthly_limit {
                warn!(
                    target: "roundup_core::worker",
                    user_id = %item.user_id,
                    address = %item.address,
                    bank_type = %item.bank_type,
                    balance = %last.payload.balance,
                    limit = %item.monthly_limit,
                    "round-up chain balance crossed the pledge's monthly limit"
                );
            }
        }

        // 5. Assemble the envelope.
        let mut envelope = ChainEnvelope {
            hash: roundup_common::domain::ChainHash::sha256(String::new()),
            payload: EnvelopePayload {
                address: item.address.clone(),
                previous,
                transactions: entries,
            },
            signatures: Vec::new(),
        };

        // 6. Sign with the server long-term key.
        chain_signer::sign(&mut envelope, self.signer.as_ref(), &self.server_kid)?;

        // 7. Enqueue on the to-signer queue.
        self.outbound.send(&envelope).await?;

        // 8. Trigger the external signer.
        self.http
            .post(format!("{}/aws/sqs", self.signer_trigger_url))
            .send()
            .await
            .map_err(|e| RoundupError::SignerHttpError(e.to_string()))?;

        info!(target: "roundup_core::worker", user_id = %item.user_id, address = %item.address, "enqueued envelope for co-signing");
        Ok(WorkOutcome::Enqueued)
    }
}
