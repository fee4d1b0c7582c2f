use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("capacity {capacity} is below the initial ticket count {initial}")]
    CapacityBelowInitial { initial: usize, capacity: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] io::Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("total tickets {initial} exceed the max ticket capacity {capacity}")]
    InitialExceedsCapacity { initial: usize, capacity: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] io::Error),

    #[error("worker {0} panicked")]
    WorkerPanicked(String),
}
