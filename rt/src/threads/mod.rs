//! IO-threads based module to support shared behavior with task based version.

pub mod mpsc;

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc as std_mpsc, Arc, Condvar, Mutex, OnceLock,
    },
    thread,
    time::Duration,
};
pub use std::thread::{sleep, spawn, JoinHandle};

use crate::tracing::init_tracing;

/// Global list of Ctrl+C subscribers
static CTRL_C_SUBSCRIBERS: OnceLock<Mutex<Vec<std_mpsc::Sender<()>>>> = OnceLock::new();

pub fn run<T>(f: impl FnOnce() -> T) -> T {
    init_tracing();

    f()
}

/// Spawns an OS thread carrying `name`, so log lines can tell workers apart.
pub fn spawn_named<F, T>(name: impl Into<String>, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new().name(name.into()).spawn(f)
}

/// Name of the calling thread, if it was given one.
pub fn current_name() -> Option<String> {
    thread::current().name().map(str::to_owned)
}

type CancelCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct TokenState {
    is_cancelled: AtomicBool,
    gate: Mutex<()>,
    wake: Condvar,
    callbacks: Mutex<Vec<CancelCallback>>,
}

/// A token that can be used to signal cancellation.
///
/// Besides polling with `is_cancelled()`, holders can park on the token with
/// `wait_timeout()` (an interruptible sleep) or register callbacks via
/// `on_cancel()` that fire when the token is cancelled.
#[derive(Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        if self.state.is_cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            // Taking the gate orders this wake after any sleeper's flag check.
            let _gate = self.state.gate.lock().unwrap_or_else(|e| e.into_inner());
            self.state.wake.notify_all();
        }
        let callbacks: Vec<_> = self
            .state
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for cb in callbacks {
            cb();
        }
    }

    /// Register a callback to be invoked when this token is cancelled.
    /// If already cancelled, the callback fires immediately.
    ///
    /// The callback fires exactly once, either here or from `cancel()`.
    pub fn on_cancel(&self, callback: CancelCallback) {
        // cancel() sets the flag before draining, so seeing it unset while
        // holding the lock means our callback will be drained later.
        let mut callbacks = self
            .state
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if self.is_cancelled() {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(callback);
        }
    }

    /// Sleeps for `timeout` or until the token is cancelled, whichever comes
    /// first. Returns `true` when woken by cancellation.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let gate = self.state.gate.lock().unwrap_or_else(|e| e.into_inner());
        let _gate = self
            .state
            .wake
            .wait_timeout_while(gate, timeout, |_| !self.is_cancelled())
            .map(|(gate, _)| gate)
            .unwrap_or_else(|e| e.into_inner().0);
        self.is_cancelled()
    }
}

/// Returns a closure that blocks until Ctrl+C is received.
///
/// Every call adds a subscriber, so several drivers can react to the same
/// signal. The process-wide handler is installed on the first call.
pub fn ctrl_c() -> impl FnOnce() + Send + 'static {
    let subscribers = CTRL_C_SUBSCRIBERS.get_or_init(|| {
        let installed = ctrlc::set_handler(|| {
            if let Some(subs) = CTRL_C_SUBSCRIBERS.get() {
                let mut guard = subs
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                // Drop subscribers whose receiver is gone
                guard.retain(|tx| tx.send(()).is_ok());
            }
        });
        if let Err(e) = installed {
            tracing::warn!("Ctrl+C handler not installed: {e}");
        }
        Mutex::new(Vec::new())
    });

    let (tx, rx) = std_mpsc::channel();
    subscribers
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push(tx);

    move || {
        let _ = rx.recv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn wait_timeout_elapses_without_cancel() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn cancel_interrupts_wait_timeout() {
        let token = CancellationToken::new();
        let sleeper = token.clone();
        let handle = spawn(move || sleeper.wait_timeout(Duration::from_secs(30)));
        sleep(Duration::from_millis(50));
        token.cancel();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn on_cancel_fires_once_and_late_callbacks_fire_immediately() {
        let token = CancellationToken::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        token.on_cancel(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        token.cancel();
        token.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let counter = fired.clone();
        token.on_cancel(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn spawn_named_sets_thread_name() {
        let handle = spawn_named("Vendor-7", current_name).unwrap();
        assert_eq!(handle.join().unwrap().as_deref(), Some("Vendor-7"));
    }
}
