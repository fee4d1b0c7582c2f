use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard};

use boxoffice_rt::tasks::{CancellationToken, Notify};
use futures::future::{select, Either};

use super::worker::current_worker;
use crate::error::PoolError;
use crate::ledger::{Ledger, PoolSnapshot, Purchase, Release, Step};
use crate::shutdown::StopSignal;
use crate::sink::{Announcer, EventSink};

struct Shared {
    // Never held across an await point.
    ledger: Mutex<Ledger>,
    stock: Notify,
    signal: StopSignal,
    announcer: Announcer,
    cancellation_token: CancellationToken,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Handle to the ticket pool shared by vendor and customer tasks.
///
/// Same contract as the thread backend's pool, with an async `purchase`.
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
            stock: Notify::new(),
            signal: StopSignal::default(),
            announcer: Announcer::new(sink),
            cancellation_token: CancellationToken::new(),
        });
        tracing::debug!(initial, capacity, "ticket pool created");
        Ok(Self { shared })
    }

    /// Never waits, so it needs no `.await`.
    pub fn release(&self, rate: usize) -> Release {
        let who = current_worker();
        let shared = &*self.shared;
        let release = {
            let mut ledger = shared.lock();
            let release = ledger.release(rate);
            shared.announcer.release(&who, &release);
            shared.signal.publish(ledger.flags(), &shared.announcer);
            release
        };
        shared.stock.notify_waiters();
        release
    }

    pub async fn purchase(&self, rate: usize) -> Purchase {
        let who = current_worker();
        let shared = &*self.shared;
        loop {
            // Registered before looking at the ledger so a release landing
            // between the check and the await still wakes us.
            let mut notified = pin!(shared.stock.notified());
            notified.as_mut().enable();

            if shared.cancellation_token.is_cancelled() {
                return Purchase::Cancelled;
            }
            let done = {
                let mut ledger = shared.lock();
                match ledger.purchase(rate) {
                    Step::Done(purchase) => {
                        shared.announcer.purchase(&who, &purchase);
                        shared.signal.publish(ledger.flags(), &shared.announcer);
                        Some(purchase)
                    }
                    Step::Wait => None,
                }
            };
            if let Some(purchase) = done {
                shared.stock.notify_waiters();
                return purchase;
            }

            tracing::trace!(who = %who, rate, "waiting for tickets");
            let cancelled = pin!(shared.cancellation_token.cancelled());
            if let Either::Right(_) = select(notified, cancelled).await {
                return Purchase::Cancelled;
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
