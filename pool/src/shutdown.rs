//! Stop flags read by every worker.
//!
//! The ledger owns the truth; `StopSignal` mirrors it so workers can poll
//! without taking the pool lock. Stores only happen with the lock held.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::ledger::Flags;
use crate::sink::Announcer;

#[derive(Debug, Default)]
pub(crate) struct StopSignal {
    vendors: AtomicBool,
    customers: AtomicBool,
}

impl StopSignal {
    pub fn vendors_stopped(&self) -> bool {
        self.vendors.load(Ordering::Acquire)
    }

    pub fn customers_stopped(&self) -> bool {
        self.customers.load(Ordering::Acquire)
    }

    /// Mirrors `flags` after a mutation. Must be called with the pool lock
    /// held so readers never see flags ahead of the state they describe.
    pub fn publish(&self, flags: Flags, announcer: &Announcer) {
        if flags.vendors_stopped {
            self.vendors.store(true, Ordering::Release);
        }
        if flags.customers_stopped && !self.customers.swap(true, Ordering::AcqRel) {
            announcer.retrieval_stopped();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::sync::Arc;

    #[test]
    fn retrieval_stop_is_announced_once() {
        let sink = Arc::new(MemorySink::default());
        let announcer = Announcer::new(Some(sink.clone()));
        let signal = StopSignal::default();
        let stopped = Flags {
            vendors_stopped: true,
            customers_stopped: true,
        };

        signal.publish(Flags::default(), &announcer);
        assert!(!signal.vendors_stopped());
        assert!(!signal.customers_stopped());

        signal.publish(stopped, &announcer);
        signal.publish(stopped, &announcer);
        assert!(signal.vendors_stopped());
        assert!(signal.customers_stopped());
        assert_eq!(sink.messages(), vec!["Customer retrieval stopped"]);
    }
}
