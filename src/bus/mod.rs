pub mod events;
pub mod queue;

pub use events::{InboundMessage, Metadata, OutboundMessage};
pub use queue::MessageBus;
