//! Pool state and the rules that decide how many tickets move per call.
//!
//! Nothing in here synchronises. Each backend keeps one `Ledger` behind its
//! lock and calls `release`/`purchase` inside the critical section.

use std::collections::VecDeque;

use crate::error::PoolError;
use crate::ticket::TicketId;

/// Outcome of a vendor's `release` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// `count` fresh tickets starting at `first` joined the pool. `count` is
    /// zero only when the requested rate was zero.
    Minted {
        first: TicketId,
        count: usize,
        pool_size: usize,
    },
    /// Capacity was already reached; nothing minted and vendors are stopped.
    Halted,
}

/// Tickets removed by one purchase, in FIFO order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    pub tickets: Vec<TicketId>,
    pub remaining: usize,
    pub sold: usize,
}

impl Sale {
    pub fn count(&self) -> usize {
        self.tickets.len()
    }
}

/// Outcome of a customer's `purchase` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purchase {
    /// Up to `rate` tickets bought.
    Bought(Sale),
    /// Close-out: production had stopped, so the whole remaining stock was
    /// taken regardless of the requested rate.
    Drained(Sale),
    /// Every ticket of the event is sold; customers are stopped.
    SoldOut,
    /// The pool was cancelled while waiting. Nothing changed.
    Cancelled,
}

impl Purchase {
    pub fn tickets(&self) -> &[TicketId] {
        match self {
            Purchase::Bought(sale) | Purchase::Drained(sale) => &sale.tickets,
            Purchase::SoldOut | Purchase::Cancelled => &[],
        }
    }

    pub fn count(&self) -> usize {
        self.tickets().len()
    }
}

/// Point-in-time view of the pool, for monitoring and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub available: usize,
    pub sold: usize,
    pub minted: usize,
    pub next_id: TicketId,
    pub capacity: usize,
    pub vendors_stopped: bool,
    pub customers_stopped: bool,
}

pub(crate) enum Step {
    Done(Purchase),
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Flags {
    pub vendors_stopped: bool,
    pub customers_stopped: bool,
}

#[derive(Debug)]
pub(crate) struct Ledger {
    available: VecDeque<TicketId>,
    capacity: usize,
    sold: usize,
    next_id: TicketId,
    flags: Flags,
}

impl Ledger {
    pub fn new(initial: usize, capacity: usize) -> Result<Self, PoolError> {
        if capacity < initial {
            return Err(PoolError::CapacityBelowInitial { initial, capacity });
        }
        let first = TicketId::FIRST;
        Ok(Ledger {
            available: (0..initial).map(|i| first.advance(i)).collect(),
            capacity,
            sold: 0,
            next_id: first.advance(initial),
            flags: Flags::default(),
        })
    }

    pub fn release(&mut self, rate: usize) -> Release {
        if self.available.len() + self.sold >= self.capacity {
            self.flags.vendors_stopped = true;
            self.settle();
            return Release::Halted;
        }

        let count = rate.min(self.capacity - self.sold - self.available.len());
        let first = self.next_id;
        self.available.extend((0..count).map(|i| first.advance(i)));
        self.next_id = first.advance(count);
        Release::Minted {
            first,
            count,
            pool_size: self.available.len(),
        }
    }

    /// One evaluation of the purchase rules. `Step::Wait` means the caller
    /// must block until another call changes the pool, then ask again.
    pub fn purchase(&mut self, rate: usize) -> Step {
        // Close-out: no more tickets will ever be minted, so whatever is left
        // goes to this caller whatever rate it asked for.
        if self.flags.vendors_stopped && !self.available.is_empty() {
            let count = self.available.len();
            return Step::Done(Purchase::Drained(self.take(count)));
        }

        if self.available.len() < rate {
            self.settle();
            if self.flags.customers_stopped {
                return Step::Done(Purchase::SoldOut);
            }
            return Step::Wait;
        }

        let count = rate.min(self.available.len());
        Step::Done(Purchase::Bought(self.take(count)))
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn sold(&self) -> usize {
        self.sold
    }

    pub fn pool_size(&self) -> usize {
        self.available.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            available: self.available.len(),
            sold: self.sold,
            minted: (self.next_id.0 - TicketId::FIRST.0) as usize,
            next_id: self.next_id,
            capacity: self.capacity,
            vendors_stopped: self.flags.vendors_stopped,
            customers_stopped: self.flags.customers_stopped,
        }
    }

    fn take(&mut self, count: usize) -> Sale {
        let tickets: Vec<TicketId> = self.available.drain(..count).collect();
        self.sold += tickets.len();
        self.settle();
        Sale {
            tickets,
            remaining: self.available.len(),
            sold: self.sold,
        }
    }

    // Sold out: production is over and every ticket has left the pool.
    fn settle(&mut self) {
        if self.flags.vendors_stopped && self.sold == self.capacity {
            self.flags.customers_stopped = true;
        }
    }

    #[cfg(test)]
    pub fn available_ids(&self) -> Vec<TicketId> {
        self.available.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn done(step: Step) -> Purchase {
        match step {
            Step::Done(purchase) => purchase,
            Step::Wait => panic!("purchase should not wait"),
        }
    }

    fn ids(range: std::ops::RangeInclusive<u64>) -> Vec<TicketId> {
        range.map(TicketId).collect()
    }

    #[test]
    fn new_prefills_initial_tickets() {
        let ledger = Ledger::new(3, 10).unwrap();
        assert_eq!(ledger.available_ids(), ids(1..=3));
        assert_eq!(ledger.snapshot().next_id, TicketId(4));
        assert_eq!(ledger.snapshot().minted, 3);
    }

    #[test]
    fn capacity_below_initial_is_rejected() {
        let err = Ledger::new(5, 4).unwrap_err();
        assert!(matches!(
            err,
            PoolError::CapacityBelowInitial {
                initial: 5,
                capacity: 4
            }
        ));
    }

    #[test]
    fn release_then_purchase_scenario() {
        let mut ledger = Ledger::new(5, 10).unwrap();

        let release = ledger.release(3);
        assert_eq!(
            release,
            Release::Minted {
                first: TicketId(6),
                count: 3,
                pool_size: 8
            }
        );
        assert_eq!(ledger.pool_size(), 8);
        assert_eq!(ledger.sold(), 0);

        let purchase = done(ledger.purchase(4));
        assert_eq!(purchase.tickets(), ids(1..=4).as_slice());
        assert_eq!(ledger.pool_size(), 4);
        assert_eq!(ledger.sold(), 4);
    }

    #[test]
    fn release_never_mints_past_capacity() {
        let mut ledger = Ledger::new(5, 10).unwrap();
        let release = ledger.release(20);
        assert_eq!(
            release,
            Release::Minted {
                first: TicketId(6),
                count: 5,
                pool_size: 10
            }
        );
        assert!(!ledger.flags().vendors_stopped);
    }

    #[test]
    fn release_at_capacity_halts_vendors() {
        let mut ledger = Ledger::new(6, 10).unwrap();
        ledger.release(4);
        done(ledger.purchase(4));
        assert_eq!(ledger.pool_size() + ledger.sold(), 10);

        assert_eq!(ledger.release(5), Release::Halted);
        assert!(ledger.flags().vendors_stopped);
        assert_eq!(ledger.snapshot().minted, 10);
    }

    #[test]
    fn release_of_zero_mints_nothing_below_capacity() {
        let mut ledger = Ledger::new(2, 10).unwrap();
        assert_eq!(
            ledger.release(0),
            Release::Minted {
                first: TicketId(3),
                count: 0,
                pool_size: 2
            }
        );
        assert!(!ledger.flags().vendors_stopped);
    }

    #[test]
    fn short_stock_waits_while_vendors_run() {
        let mut ledger = Ledger::new(2, 10).unwrap();
        assert!(matches!(ledger.purchase(3), Step::Wait));
        assert_eq!(ledger.pool_size(), 2);
        assert_eq!(ledger.sold(), 0);
    }

    #[test]
    fn close_out_drains_everything_regardless_of_rate() {
        let mut ledger = Ledger::new(3, 3).unwrap();
        assert_eq!(ledger.release(1), Release::Halted);

        let purchase = done(ledger.purchase(5));
        assert!(matches!(purchase, Purchase::Drained(_)));
        assert_eq!(purchase.tickets(), ids(1..=3).as_slice());
        assert_eq!(ledger.pool_size(), 0);
        assert_eq!(ledger.sold(), 3);
        assert!(ledger.flags().customers_stopped);
    }

    #[test]
    fn close_out_with_rate_one_takes_all_three() {
        let mut ledger = Ledger::new(0, 5).unwrap();
        ledger.release(5);
        done(ledger.purchase(2));
        assert_eq!(ledger.release(1), Release::Halted);
        assert_eq!(ledger.pool_size(), 3);

        let purchase = done(ledger.purchase(1));
        assert!(matches!(purchase, Purchase::Drained(_)));
        assert_eq!(purchase.tickets(), ids(3..=5).as_slice());
        assert_eq!(ledger.pool_size(), 0);
        assert_eq!(ledger.sold(), 5);
        assert!(ledger.flags().customers_stopped);
    }

    #[test]
    fn regular_purchase_takes_at_most_rate() {
        let mut ledger = Ledger::new(6, 10).unwrap();
        let purchase = done(ledger.purchase(4));
        assert!(matches!(purchase, Purchase::Bought(_)));
        assert_eq!(purchase.count(), 4);
        assert_eq!(ledger.pool_size(), 2);

        let purchase = done(ledger.purchase(0));
        assert_eq!(purchase.count(), 0);
        assert_eq!(ledger.pool_size(), 2);
    }

    #[test]
    fn sold_out_sets_customer_stop_for_any_rate() {
        for rate in [0, 1, 7] {
            let mut ledger = Ledger::new(2, 2).unwrap();
            done(ledger.purchase(2));
            // Vendors stop only on the next release.
            assert!(!ledger.flags().customers_stopped);
            assert_eq!(ledger.release(1), Release::Halted);

            let purchase = done(ledger.purchase(rate));
            assert!(ledger.flags().customers_stopped, "rate {rate}");
            assert_eq!(purchase.count(), 0);
        }
    }

    #[test]
    fn empty_event_stops_everyone_on_first_release() {
        let mut ledger = Ledger::new(0, 0).unwrap();
        assert_eq!(ledger.release(3), Release::Halted);
        let flags = ledger.flags();
        assert!(flags.vendors_stopped);
        assert!(flags.customers_stopped);
        assert_eq!(done(ledger.purchase(1)), Purchase::SoldOut);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Release(usize),
        Purchase(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..6).prop_map(Op::Release),
            (0usize..6).prop_map(Op::Purchase),
        ]
    }

    fn event_strategy() -> impl Strategy<Value = (usize, usize)> {
        (0usize..40).prop_flat_map(|capacity| (0..=capacity, Just(capacity)))
    }

    proptest! {
        /// Property: capacity, monotonicity, conservation and no double-sale
        /// hold after every operation.
        #[test]
        fn prop_invariants_hold(
            (initial, capacity) in event_strategy(),
            ops in prop::collection::vec(op_strategy(), 0..80)
        ) {
            let mut ledger = Ledger::new(initial, capacity).unwrap();
            let mut sold_ids: HashSet<TicketId> = HashSet::new();
            let mut last = ledger.snapshot();

            for op in ops {
                match op {
                    Op::Release(rate) => {
                        ledger.release(rate);
                    }
                    Op::Purchase(rate) => {
                        if let Step::Done(purchase) = ledger.purchase(rate) {
                            for id in purchase.tickets() {
                                prop_assert!(sold_ids.insert(*id), "{id} sold twice");
                            }
                        }
                    }
                }

                let now = ledger.snapshot();
                prop_assert!(now.available + now.sold <= capacity);
                prop_assert!(now.sold >= last.sold);
                prop_assert!(now.next_id >= last.next_id);
                prop_assert_eq!(now.minted, now.sold + now.available);
                prop_assert!(now.minted <= capacity);
                prop_assert!(!last.vendors_stopped || now.vendors_stopped);
                prop_assert!(!last.customers_stopped || now.customers_stopped);

                let available = ledger.available_ids();
                prop_assert!(available.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(available.iter().all(|id| !sold_ids.contains(id)));
                last = now;
            }
        }

        /// Property: with rates of at least one, alternating cycles stop both
        /// roles within a bounded number of calls and sell every ticket.
        #[test]
        fn prop_cycles_terminate(
            (initial, capacity) in event_strategy(),
            release_rate in 1usize..8,
            retrieval_rate in 1usize..8
        ) {
            let mut ledger = Ledger::new(initial, capacity).unwrap();
            let bound = 2 * capacity + 3;
            let mut cycles = 0;
            while !ledger.flags().customers_stopped {
                prop_assert!(cycles < bound, "no termination after {cycles} cycles");
                if !ledger.flags().vendors_stopped {
                    ledger.release(release_rate);
                }
                let _ = ledger.purchase(retrieval_rate);
                cycles += 1;
            }
            prop_assert!(ledger.flags().vendors_stopped);
            prop_assert_eq!(ledger.sold(), capacity);
            prop_assert_eq!(ledger.pool_size(), 0);
        }

        /// Property: once vendors stop with k > 0 tickets left, the next
        /// purchase at any rate removes exactly k.
        #[test]
        fn prop_close_out_drain(
            (initial, capacity) in event_strategy(),
            rate in 0usize..10
        ) {
            let mut ledger = Ledger::new(initial, capacity).unwrap();
            while ledger.release(capacity) != Release::Halted {}
            let k = ledger.pool_size();
            prop_assume!(k > 0);

            let purchase = done(ledger.purchase(rate));
            prop_assert_eq!(purchase.count(), k);
            prop_assert_eq!(ledger.pool_size(), 0);
        }
    }
}
