//! Unbounded tokio channels, used to relay pool messages to a printer task.

pub use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
