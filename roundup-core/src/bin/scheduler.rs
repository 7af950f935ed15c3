use std::sync::Arc;

use aws_config::BehaviorVersion;
use clap::Parser;
use tracing_subscriber::prelude::*;

use roundup_aggregator::AggregatorClient;
use roundup_common::auth::Ed25519Signer;
use roundup_core::{Config, IntakeWorker, Scheduler, SchedulerArgs};
use roundup_queue::OutboundQueue;
use roundup_store::RedbStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,roundup_core=debug".into()),
        )
        .init();

    let args = SchedulerArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(target: "roundup_core::bin::scheduler", error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let signer = match Ed25519Signer::from_hex(&config.server_private_key) {
        Ok(signer) => Arc::new(signer),
        Err(e) => {
            tracing::error!(target: "roundup_core::bin::scheduler", error = %e, "invalid SERVER_PRIVATE_KEY");
            std::process::exit(1);
        }
    };

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let sqs_client = aws_sdk_sqs::Client::new(&sdk_config);

    let store = match RedbStore::open(&config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(target: "roundup_core::bin::scheduler", error = %e, "failed to open storage");
            std::process::exit(1);
        }
    };
    let aggregator = AggregatorClient::new(config.aggregator_base_url(), config.plaid_client_id.clone(), config.plaid_secret.clone());
    let outbound = OutboundQueue::new(sqs_client, config.aws_sqs_url_to_signer.clone());

    let worker = Arc::new(IntakeWorker::new(
        store.clone(),
        aggregator,
        outbound,
        signer,
        config.server_kid.clone(),
        config.signer_url.clone(),
    ));

    let scheduler = Scheduler::new(store, worker, args.concurrency);

    match scheduler.run(args.gte, args.lte).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(target: "roundup_core::bin::scheduler", error = %e, "scheduling pass failed");
            std::process::exit(1);
        }
    }
}
