//! Tokio based flavour of the runtime wrapper.
//!
//! Only the handful of tokio items the pool needs are reexported, so library
//! code never names `tokio` directly.

mod tokio;

use std::future::Future;

use crate::tracing::init_tracing;

pub use crate::tasks::tokio::mpsc;
pub use crate::tasks::tokio::{
    sleep, spawn, task_local, timeout, CancellationToken, JoinHandle, Notify, Runtime,
};

/// Initialises tracing and drives `future` to completion on a fresh runtime.
pub fn run<F: Future>(future: F) -> std::io::Result<F::Output> {
    init_tracing();

    let rt = Runtime::new()?;
    Ok(rt.block_on(future))
}

/// Resolves when Ctrl+C is received. Never resolves if the signal handler
/// cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = ::tokio::signal::ctrl_c().await {
        tracing::warn!("Ctrl+C listener failed: {e}");
        std::future::pending::<()>().await;
    }
}
