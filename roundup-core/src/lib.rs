pub mod cli;
pub mod config;
pub mod consumer;
pub mod scheduler;
pub mod worker;

pub use cli::{ConsumerArgs, SchedulerArgs};
pub use config::Config;
pub use consumer::Consumer;
pub use scheduler::Scheduler;
pub use worker::{IntakeWorker, WorkItem, WorkOutcome};
