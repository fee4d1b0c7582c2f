//! Tokio backend: the same pool contract with an async `purchase` and
//! workers running as tasks.

mod pool;
mod simulation;
mod worker;


pub use pool::TicketPool;
pub use simulation::Simulation;
pub use worker::{Customer, Vendor};
