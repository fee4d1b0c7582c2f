//! Vendor and customer loops running as tokio tasks.

use std::pin::pin;
use std::time::Duration;

use boxoffice_rt::tasks::{self as rt, CancellationToken, JoinHandle};
use futures::future::{select, Either};

use super::TicketPool;
use crate::ledger::{Purchase, Release};
use crate::worker::{WorkerReport, CYCLE_INTERVAL};

rt::task_local! {
    static WORKER_NAME: String;
}

/// Name of the worker running the current task.
pub(crate) fn current_worker() -> String {
    WORKER_NAME
        .try_with(Clone::clone)
        .unwrap_or_else(|_| "anonymous".to_string())
}

/// Sleeps for `interval`. Returns `true` when cut short by cancellation.
async fn pause(token: &CancellationToken, interval: Duration) -> bool {
    let cancelled = pin!(token.cancelled());
    let sleep = pin!(rt::sleep(interval));
    matches!(select(cancelled, sleep).await, Either::Left(_))
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

    pub fn report(&self) -> WorkerReport {
        self.report
    }

    pub fn step(&mut self) -> Release {
        let release = self.pool.release(self.rate);
        self.report.cycles += 1;
        if let Release::Minted { count, .. } = release {
            self.report.tickets += count;
        }
        release
    }

    pub async fn run(mut self) -> WorkerReport {
        let token = self.pool.cancellation_token();
        let name = current_worker();
        tracing::info!(role = "vendor", "{name} started");

        while !self.pool.vendors_stopped() && !token.is_cancelled() {
            self.step();
            if self.pool.vendors_stopped() {
                break;
            }
            if pause(&token, self.interval).await {
                break;
            }
        }

        tracing::info!(
            role = "vendor",
            cycles = self.report.cycles,
            tickets = self.report.tickets,
            cancelled = token.is_cancelled(),
            "{name} stopped"
        );
        self.report
    }

    /// Runs the vendor on its own task; pool messages carry `name`.
    pub fn spawn(self, name: impl Into<String>) -> JoinHandle<WorkerReport> {
        rt::spawn(WORKER_NAME.scope(name.into(), self.run()))
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

    pub fn report(&self) -> WorkerReport {
        self.report
    }

    pub async fn step(&mut self) -> Purchase {
        let purchase = self.pool.purchase(self.rate).await;
        self.report.cycles += 1;
        self.report.tickets += purchase.count();
        purchase
    }

    pub async fn run(mut self) -> WorkerReport {
        let token = self.pool.cancellation_token();
        let name = current_worker();
        tracing::info!(role = "customer", "{name} started");

        while !self.pool.customers_stopped() && !token.is_cancelled() {
            self.step().await;
            if self.pool.customers_stopped() {
                break;
            }
            if pause(&token, self.interval).await {
                break;
            }
        }

        tracing::info!(
            role = "customer",
            cycles = self.report.cycles,
            tickets = self.report.tickets,
            cancelled = token.is_cancelled(),
            "{name} stopped"
        );
        self.report
    }

    pub fn spawn(self, name: impl Into<String>) -> JoinHandle<WorkerReport> {
        rt::spawn(WORKER_NAME.scope(name.into(), self.run()))
    }
}
