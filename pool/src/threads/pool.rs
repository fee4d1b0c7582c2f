use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use boxoffice_rt::threads::{self as rt, CancellationToken};

use crate::error::PoolError;
use crate::ledger::{Ledger, PoolSnapshot, Purchase, Release, Step};
use crate::shutdown::StopSignal;
use crate::sink::{Announcer, EventSink};

struct Shared {
    ledger: Mutex<Ledger>,
    // Broadcast after every mutation; only purchases ever wait on it.
    stock: Condvar,
    signal: StopSignal,
    announcer: Announcer,
    cancellation_token: CancellationToken,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Handle to the ticket pool shared by every vendor and customer thread.
///
/// Cloning is cheap; all clones point at the same pool. `release` and
/// `purchase` each run in one critical section of a single mutex covering
/// the ticket queue, the counters and the stop flags.
#[derive(Clone)]
pub struct TicketPool {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for TicketPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketPool").finish_non_exhaustive()
    }
}

impl TicketPool {
    /// Pool pre-filled with tickets `1..=initial`. Fails when `capacity`
    /// is below `initial`.
    pub fn new(initial: usize, capacity: usize) -> Result<Self, PoolError> {
        Self::build(initial, capacity, None)
    }

    pub fn with_sink(
        initial: usize,
        capacity: usize,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, PoolError> {
        Self::build(initial, capacity, Some(sink))
    }

    fn build(
        initial: usize,
        capacity: usize,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Result<Self, PoolError> {
        let shared = Arc::new(Shared {
            ledger: Mutex::new(Ledger::new(initial, capacity)?),
            stock: Condvar::new(),
            signal: StopSignal::default(),
            announcer: Announcer::new(sink),
            cancellation_token: CancellationToken::new(),
        });

        // Waiters recheck the token under the lock, so waking them while
        // holding it cannot slip between their check and their wait.
        let weak = Arc::downgrade(&shared);
        shared.cancellation_token.on_cancel(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                let _ledger = shared.lock();
                shared.stock.notify_all();
            }
        }));

        tracing::debug!(initial, capacity, "ticket pool created");
        Ok(Self { shared })
    }

    /// Mints up to `rate` tickets, never past capacity. Once capacity is
    /// reached nothing is minted and vendors are told to stop.
    pub fn release(&self, rate: usize) -> Release {
        let who = caller();
        let shared = &*self.shared;
        let mut ledger = shared.lock();
        let release = ledger.release(rate);
        shared.announcer.release(&who, &release);
        shared.signal.publish(ledger.flags(), &shared.announcer);
        shared.stock.notify_all();
        release
    }

    /// Buys `rate` tickets, blocking while fewer are available and more may
    /// still be minted. Once production has stopped the whole remaining
    /// stock is taken in one go. Returns `Purchase::Cancelled`, untouched,
    /// if the pool is cancelled first.
    pub fn purchase(&self, rate: usize) -> Purchase {
        let who = caller();
        let shared = &*self.shared;
        let mut ledger = shared.lock();
        loop {
            if shared.cancellation_token.is_cancelled() {
                return Purchase::Cancelled;
            }
            match ledger.purchase(rate) {
                Step::Done(purchase) => {
                    shared.announcer.purchase(&who, &purchase);
                    shared.signal.publish(ledger.flags(), &shared.announcer);
                    shared.stock.notify_all();
                    return purchase;
                }
                Step::Wait => {
                    tracing::trace!(who = %who, rate, "waiting for tickets");
                    ledger = shared
                        .stock
                        .wait(ledger)
                        .unwrap_or_else(|p| p.into_inner());
                }
            }
        }
    }

    pub fn sold(&self) -> usize {
        self.shared.lock().sold()
    }

    pub fn pool_size(&self) -> usize {
        self.shared.lock().pool_size()
    }

    pub fn capacity(&self) -> usize {
        self.shared.lock().capacity()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.shared.lock().snapshot()
    }

    pub fn vendors_stopped(&self) -> bool {
        self.shared.signal.vendors_stopped()
    }

    pub fn customers_stopped(&self) -> bool {
        self.shared.signal.customers_stopped()
    }

    /// Force-stops the run: blocked purchases return `Purchase::Cancelled`
    /// and workers leave their loops.
    pub fn cancel(&self) {
        self.shared.cancellation_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancellation_token.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.shared.cancellation_token.clone()
    }
}

fn caller() -> String {
    rt::current_name().unwrap_or_else(|| "anonymous".to_string())
}
