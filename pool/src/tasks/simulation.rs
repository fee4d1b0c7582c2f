use std::sync::Arc;
use std::time::Duration;

use boxoffice_rt::tasks::JoinHandle;
use futures::future::join_all;

use super::{Customer, TicketPool, Vendor};
use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::simulation::SimulationSummary;
use crate::sink::EventSink;
use crate::worker::{WorkerReport, CYCLE_INTERVAL};

type Spawned = Vec<(String, JoinHandle<WorkerReport>)>;

/// One run on the tokio runtime. `start` must be called from inside it.
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

        let vendors = (1..=config.vendors)
            .map(|i| {
                let name = format!("Vendor-{i}");
                let vendor = Vendor::new(pool.clone(), config.ticket_release_rate)
                    .with_interval(interval);
                (name.clone(), vendor.spawn(name))
            })
            .collect();
        let customers = (1..=config.customers)
            .map(|i| {
                let name = format!("Customer-{i}");
                let customer = Customer::new(pool.clone(), config.customer_retrieval_rate)
                    .with_interval(interval);
                (name.clone(), customer.spawn(name))
            })
            .collect();

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

    /// Force-stops every worker, including customers waiting in the pool.
    pub fn stop(&self) {
        tracing::info!("simulation stop requested");
        self.pool.cancel();
    }

    pub async fn wait(self) -> Result<SimulationSummary, SimulationError> {
        let vendor_reports = join_workers(&self.pool, self.vendors).await?;
        let customer_reports = join_workers(&self.pool, self.customers).await?;
        Ok(SimulationSummary::new(
            self.pool.snapshot(),
            vendor_reports,
            customer_reports,
            self.pool.is_cancelled(),
        ))
    }
}

async fn join_workers(
    pool: &TicketPool,
    workers: Spawned,
) -> Result<Vec<WorkerReport>, SimulationError> {
    let joined = join_all(workers.into_iter().map(|(name, handle)| async move {
        handle
            .await
            .map_err(|_| SimulationError::WorkerPanicked(name))
    }))
    .await;

    let reports: Result<Vec<_>, _> = joined.into_iter().collect();
    if reports.is_err() {
        pool.cancel();
    }
    reports
}
