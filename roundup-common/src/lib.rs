pub mod auth;
pub mod canonical;
pub mod domain;
pub mod error;
pub mod filter;
pub mod money;
pub mod time;

pub use error::{Result, RoundupError};
