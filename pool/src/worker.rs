use std::time::Duration;

/// Pause between two cycles of a vendor or customer.
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(1);

/// What a worker did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub cycles: usize,
    /// Tickets minted by a vendor or bought by a customer.
    pub tickets: usize,
}
