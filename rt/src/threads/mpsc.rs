//! std channels for thread backed code, named like the tokio ones.

pub use std::sync::mpsc::{channel as unbounded_channel, Receiver, SendError, Sender};
