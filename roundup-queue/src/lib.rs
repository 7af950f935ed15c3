pub mod inbound;
pub mod outbound;

pub use inbound::{InboundMessage, InboundQueue};
pub use outbound::OutboundQueue;
