use clap::Parser;

/// Entry point for the round-up scheduler (C9).
#[derive(Parser, Debug)]
#[command(name = "roundup-scheduler")]
#[command(about = "Selects eligible users and fans out intake workers")]
pub struct SchedulerArgs {
    /// Overrides the lower bound of the date range fetched from the aggregator (YYYY-MM-DD).
    #[arg(long)]
    pub gte: Option<String>,

    /// Overrides the upper bound of the date range fetched from the aggregator (YYYY-MM-DD).
    #[arg(long)]
    pub lte: Option<String>,

    /// Hard cap on concurrent intake workers.
    #[arg(long, default_value_t = 10)]
    pub concurrency: usize,
}

/// Entry point for the round-up consumer (C10).
#[derive(Parser, Debug)]
#[command(name = "roundup-consumer")]
#[command(about = "Drains the from-signer queue, verifies, and commits chains")]
pub struct ConsumerArgs {
    /// Consecutive empty polls tolerated before terminating.
    #[arg(long, default_value_t = 3)]
    pub empty_poll_limit: u32,
}
