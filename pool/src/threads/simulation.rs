use std::sync::Arc;
use std::time::Duration;

use boxoffice_rt::threads::JoinHandle;

use super::{Customer, TicketPool, Vendor, Worker};
use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::simulation::SimulationSummary;
use crate::sink::EventSink;
use crate::worker::{WorkerReport, CYCLE_INTERVAL};

type Spawned = Vec<(String, JoinHandle<WorkerReport>)>;

/// One run: a pool plus the vendor and customer threads working on it.
#[derive(Debug)]
pub struct Simulation {
    pool: TicketPool,
    vendors: Spawned,
    customers: Spawned,
}

impl Simulation {
    pub fn start(
        config: &SimulationConfig,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Result<Self, SimulationError> {
        Self::start_with_interval(config, sink, CYCLE_INTERVAL)
    }

    pub fn start_with_interval(
        config: &SimulationConfig,
        sink: Option<Arc<dyn EventSink>>,
        interval: Duration,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let pool = match sink {
            Some(sink) => {
                TicketPool::with_sink(config.total_tickets, config.max_ticket_capacity, sink)?
            }
            None => TicketPool::new(config.total_tickets, config.max_ticket_capacity)?,
        };

        let mut vendors = Vec::with_capacity(config.vendors);
        let mut customers = Vec::with_capacity(config.customers);
        let spawned = spawn_workers(&pool, config, interval, &mut vendors, &mut customers);

        if let Err(e) = spawned {
            // Already running workers must not outlive a failed start.
            pool.cancel();
            return Err(e.into());
        }

        tracing::info!(
            vendors = config.vendors,
            customers = config.customers,
            capacity = config.max_ticket_capacity,
            "simulation started"
        );
        Ok(Self {
            pool,
            vendors,
            customers,
        })
    }

    pub fn pool(&self) -> &TicketPool {
        &self.pool
    }

    /// Force-stops every worker, including customers blocked in the pool.
    pub fn stop(&self) {
        tracing::info!("simulation stop requested");
        self.pool.cancel();
    }

    /// Joins every worker. Returns once vendors and customers have all left
    /// their loops, either because the event sold out or after `stop`.
    pub fn wait(self) -> Result<SimulationSummary, SimulationError> {
        let vendor_reports = join_all(&self.pool, self.vendors)?;
        let customer_reports = join_all(&self.pool, self.customers)?;
        Ok(SimulationSummary::new(
            self.pool.snapshot(),
            vendor_reports,
            customer_reports,
            self.pool.is_cancelled(),
        ))
    }
}

fn spawn_workers(
    pool: &TicketPool,
    config: &SimulationConfig,
    interval: Duration,
    vendors: &mut Spawned,
    customers: &mut Spawned,
) -> std::io::Result<()> {
    for i in 1..=config.vendors {
        let name = format!("Vendor-{i}");
        let vendor = Vendor::new(pool.clone(), config.ticket_release_rate).with_interval(interval);
        vendors.push((name.clone(), vendor.spawn(name)?));
    }
    for i in 1..=config.customers {
        let name = format!("Customer-{i}");
        let customer =
            Customer::new(pool.clone(), config.customer_retrieval_rate).with_interval(interval);
        customers.push((name.clone(), customer.spawn(name)?));
    }
    Ok(())
}

fn join_all(pool: &TicketPool, workers: Spawned) -> Result<Vec<WorkerReport>, SimulationError> {
    let mut reports = Vec::with_capacity(workers.len());
    for (name, handle) in workers {
        match handle.join() {
            Ok(report) => reports.push(report),
            Err(_) => {
                pool.cancel();
                return Err(SimulationError::WorkerPanicked(name));
            }
        }
    }
    Ok(reports)
}
