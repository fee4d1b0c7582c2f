//! Vendor and customer loops running on dedicated OS threads.

use std::io;
use std::time::Duration;

use boxoffice_rt::threads::{self as rt, JoinHandle};

use super::TicketPool;
use crate::ledger::{Purchase, Release};
use crate::worker::{WorkerReport, CYCLE_INTERVAL};

/// A loop that hits the pool once per cycle until its role is stopped or
/// the pool is cancelled.
pub trait Worker
where
    Self: Send + Sized + 'static,
{
    fn role(&self) -> &'static str;

    fn pool(&self) -> &TicketPool;

    fn interval(&self) -> Duration;

    /// One release or purchase.
    fn cycle(&mut self);

    fn should_stop(&self) -> bool;

    fn report(&self) -> WorkerReport;

    fn run(mut self) -> WorkerReport {
        let name = rt::current_name().unwrap_or_else(|| self.role().to_string());
        let token = self.pool().cancellation_token();
        tracing::info!(role = self.role(), "{name} started");

        while !self.should_stop() && !token.is_cancelled() {
            self.cycle();
            if self.should_stop() {
                break;
            }
            if token.wait_timeout(self.interval()) {
                break;
            }
        }

        let report = self.report();
        tracing::info!(
            role = self.role(),
            cycles = report.cycles,
            tickets = report.tickets,
            cancelled = token.is_cancelled(),
            "{name} stopped"
        );
        report
    }

    fn spawn(self, name: impl Into<String>) -> io::Result<JoinHandle<WorkerReport>> {
        rt::spawn_named(name, move || self.run())
    }
}

/// Releases `rate` tickets per cycle.
#[derive(Debug, Clone)]
pub struct Vendor {
    pool: TicketPool,
    rate: usize,
    interval: Duration,
    report: WorkerReport,
}

impl Vendor {
    pub fn new(pool: TicketPool, rate: usize) -> Self {
        Self {
            pool,
            rate,
            interval: CYCLE_INTERVAL,
            report: WorkerReport::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs exactly one cycle without pausing.
    pub fn step(&mut self) -> Release {
        let release = self.pool.release(self.rate);
        self.report.cycles += 1;
        if let Release::Minted { count, .. } = release {
            self.report.tickets += count;
        }
        release
    }
}

impl Worker for Vendor {
    fn role(&self) -> &'static str {
        "vendor"
    }

    fn pool(&self) -> &TicketPool {
        &self.pool
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn cycle(&mut self) {
        self.step();
    }

    fn should_stop(&self) -> bool {
        self.pool.vendors_stopped()
    }

    fn report(&self) -> WorkerReport {
        self.report
    }
}

/// Buys `rate` tickets per cycle.
#[derive(Debug, Clone)]
pub struct Customer {
    pool: TicketPool,
    rate: usize,
    interval: Duration,
    report: WorkerReport,
}

impl Customer {
    pub fn new(pool: TicketPool, rate: usize) -> Self {
        Self {
            pool,
            rate,
            interval: CYCLE_INTERVAL,
            report: WorkerReport::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs exactly one cycle without pausing. May block inside the pool.
    pub fn step(&mut self) -> Purchase {
        let purchase = self.pool.purchase(self.rate);
        self.report.cycles += 1;
        self.report.tickets += purchase.count();
        purchase
    }
}

impl Worker for Customer {
    fn role(&self) -> &'static str {
        "customer"
    }

    fn pool(&self) -> &TicketPool {
        &self.pool
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn cycle(&mut self) {
        self.step();
    }

    fn should_stop(&self) -> bool {
        self.pool.customers_stopped()
    }

    fn report(&self) -> WorkerReport {
        self.report
    }
}
