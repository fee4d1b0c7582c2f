use crate::ledger::PoolSnapshot;
use crate::worker::WorkerReport;

/// Outcome of a whole run, once every worker has been joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    pub minted: usize,
    pub sold: usize,
    pub vendor_reports: Vec<WorkerReport>,
    pub customer_reports: Vec<WorkerReport>,
    pub cancelled: bool,
}

impl SimulationSummary {
    pub(crate) fn new(
        snapshot: PoolSnapshot,
        vendor_reports: Vec<WorkerReport>,
        customer_reports: Vec<WorkerReport>,
        cancelled: bool,
    ) -> Self {
        let summary = Self {
            minted: snapshot.minted,
            sold: snapshot.sold,
            vendor_reports,
            customer_reports,
            cancelled,
        };
        tracing::info!(
            minted = summary.minted,
            sold = summary.sold,
            cancelled,
            "simulation finished"
        );
        summary
    }

    /// Tickets bought across all customers.
    pub fn bought(&self) -> usize {
        self.customer_reports.iter().map(|r| r.tickets).sum()
    }

    /// Tickets released across all vendors, initial stock excluded.
    pub fn released(&self) -> usize {
        self.vendor_reports.iter().map(|r| r.tickets).sum()
    }
}
