//! Box office simulation on OS threads.
//!
//! Vendors release tickets into a bounded pool while customers buy them,
//! until the event capacity is sold out.
//!
//! Run with: cargo run --bin box_office_threads [config.json] [--save]
//!
//! Without a config path the built-in defaults are used. `--save` writes the
//! config in use back to the given path (or `config.json`).
//! Press Ctrl+C to force-stop every worker.

use std::path::PathBuf;
use std::sync::Arc;

use boxoffice_pool::{threads::Simulation, ChannelSink, SimulationConfig, SimulationError};
use boxoffice_rt::threads as rt;

const DEFAULT_CONFIG_PATH: &str = "config.json";

fn main() {
    rt::run(|| {
        if let Err(e) = box_office() {
            tracing::error!("Box office failed: {e}");
            std::process::exit(1);
        }
    })
}

fn box_office() -> Result<(), SimulationError> {
    let mut path = None;
    let mut save = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--save" => save = true,
            _ => path = Some(PathBuf::from(arg)),
        }
    }

    let config = match &path {
        Some(path) if path.exists() => SimulationConfig::load(path)?,
        _ => SimulationConfig::default(),
    };
    if save {
        let target = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        config.save(&target)?;
        tracing::info!("Configuration saved to {}", target.display());
    }
    tracing::info!("Starting box office with {config:?}");

    let (sink, messages) = ChannelSink::new();
    let printer = rt::spawn(move || {
        for message in messages {
            tracing::info!("{message}");
        }
    });

    let simulation = Simulation::start(&config, Some(Arc::new(sink)))?;

    // Holds only the token, so the pool and its sink drop once the run ends.
    let token = simulation.pool().cancellation_token();
    let ctrl_c = rt::ctrl_c();
    rt::spawn(move || {
        ctrl_c();
        tracing::info!("Received Ctrl+C, stopping workers");
        token.cancel();
    });

    let summary = simulation.wait()?;
    let _ = printer.join();

    tracing::info!(
        "Box office closed: {} of {} tickets sold ({} bought, {} released){}",
        summary.sold,
        summary.minted,
        summary.bought(),
        summary.released(),
        if summary.cancelled { ", stopped early" } else { "" }
    );
    Ok(())
}
