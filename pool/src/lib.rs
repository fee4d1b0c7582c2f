//! # boxoffice-pool
//!
//! A bounded ticket pool shared by producer and consumer workers.
//!
//! Vendors release batches of freshly numbered tickets into the pool until the
//! event capacity is minted. Customers buy batches, waiting while the pool is
//! short. Once vendors are done, customers drain whatever is left and the run
//! settles as sold out.
//!
//! The bookkeeping lives in one place and is shared by two backends:
//!
//! - [`threads`] - a mutex/condvar monitor; workers are named OS threads.
//! - [`tasks`] - the same contract on tokio; `purchase` is async.
//!
//! ## Quick Start
//!
//! ```ignore
//! use boxoffice_pool::{threads::Simulation, SimulationConfig};
//!
//! let config = SimulationConfig::default();
//! let summary = Simulation::start(&config, None)?.wait()?;
//! assert_eq!(summary.sold, config.max_ticket_capacity);
//! ```
//!
//! Progress messages ("Vendor-1 added 5 tickets...") go to an optional
//! [`EventSink`]; structured diagnostics go through `tracing`.

pub mod config;
pub mod error;
mod ledger;
mod shutdown;
pub mod sink;
mod simulation;
mod ticket;
mod worker;

pub mod tasks;
pub mod threads;

pub use config::SimulationConfig;
pub use error::{ConfigError, PoolError, SimulationError};
pub use ledger::{PoolSnapshot, Purchase, Release, Sale};
pub use simulation::SimulationSummary;
pub use sink::{ChannelSink, EventSink, MemorySink};
pub use ticket::TicketId;
pub use worker::{WorkerReport, CYCLE_INTERVAL};
