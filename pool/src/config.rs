//! Simulation parameters, stored as the JSON file the box office has always
//! used (`totalTickets`, `ticketReleaseRate`, ...).

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CAPACITY_RANGE: RangeInclusive<usize> = 1..=200;
const RELEASE_RATE_RANGE: RangeInclusive<usize> = 1..=20;
const RETRIEVAL_RATE_RANGE: RangeInclusive<usize> = 1..=10;
const TOTAL_TICKETS_RANGE: RangeInclusive<usize> = 1..=100;
const WORKERS_RANGE: RangeInclusive<usize> = 1..=5;

fn one() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Tickets already in the pool when the run starts.
    pub total_tickets: usize,
    /// Tickets each vendor releases per cycle.
    pub ticket_release_rate: usize,
    /// Tickets each customer asks for per cycle.
    pub customer_retrieval_rate: usize,
    /// Hard ceiling on tickets for the event.
    pub max_ticket_capacity: usize,
    #[serde(default = "one")]
    pub vendors: usize,
    #[serde(default = "one")]
    pub customers: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_tickets: 10,
            ticket_release_rate: 5,
            customer_retrieval_rate: 3,
            max_ticket_capacity: 50,
            vendors: 2,
            customers: 3,
        }
    }
}

impl SimulationConfig {
    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check("maxTicketCapacity", self.max_ticket_capacity, CAPACITY_RANGE)?;
        check("ticketReleaseRate", self.ticket_release_rate, RELEASE_RATE_RANGE)?;
        check(
            "customerRetrievalRate",
            self.customer_retrieval_rate,
            RETRIEVAL_RATE_RANGE,
        )?;
        check("totalTickets", self.total_tickets, TOTAL_TICKETS_RANGE)?;
        check("vendors", self.vendors, WORKERS_RANGE)?;
        check("customers", self.customers, WORKERS_RANGE)?;
        if self.total_tickets > self.max_ticket_capacity {
            return Err(ConfigError::InitialExceedsCapacity {
                initial: self.total_tickets,
                capacity: self.max_ticket_capacity,
            });
        }
        Ok(())
    }
}

fn check(
    field: &'static str,
    value: usize,
    range: RangeInclusive<usize>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
