use aws_config::BehaviorVersion;
use clap::Parser;
use tracing_subscriber::prelude::*;

use roundup_core::{Config, Consumer, ConsumerArgs};
use roundup_queue::InboundQueue;
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

    let args = ConsumerArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(target: "roundup_core::bin::consumer", error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let sqs_client = aws_sdk_sqs::Client::new(&sdk_config);

    let store = match RedbStore::open(&config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(target: "roundup_core::bin::consumer", error = %e, "failed to open storage");
            std::process::exit(1);
        }
    };
    let inbound = InboundQueue::new(sqs_client, config.aws_sqs_url_from_signer.clone());

    let consumer = Consumer::new(store, inbound, config.signer_public_key.clone(), args.empty_poll_limit);

    match consumer.run().await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(target: "roundup_core::bin::consumer", error = %e, "consumer terminated with an error");
            std::process::exit(1);
        }
    }
}
