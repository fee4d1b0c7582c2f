//! OS-thread backend: a mutex/condvar monitor and blocking worker loops.

mod pool;
mod simulation;
mod worker;


pub use pool::TicketPool;
pub use simulation::Simulation;
pub use worker::{Customer, Vendor, Worker};
