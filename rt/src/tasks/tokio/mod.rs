//! Tokio.rs reexports to prevent tokio dependencies within external code
pub mod mpsc;

pub use tokio::{
    runtime::Runtime,
    sync::Notify,
    task::{spawn, JoinHandle},
    task_local,
    time::{sleep, timeout},
};
pub use tokio_util::sync::CancellationToken;
