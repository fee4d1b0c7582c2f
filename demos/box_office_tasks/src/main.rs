//! Box office simulation on tokio tasks.
//!
//! Same run as `box_office_threads`, with customers awaiting stock instead of
//! blocking a thread.
//!
//! Run with: cargo run --bin box_office_tasks [config.json] [--save]

use std::path::PathBuf;
use std::sync::Arc;

use boxoffice_pool::{tasks::Simulation, SimulationConfig, SimulationError};
use boxoffice_rt::tasks as rt;

const DEFAULT_CONFIG_PATH: &str = "config.json";

fn main() {
    let outcome = rt::run(box_office());
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!("Box office failed: {e}");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Could not start the runtime: {e}");
            std::process::exit(1);
        }
    }
}

async fn box_office() -> Result<(), SimulationError> {
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

    let (tx, mut messages) = rt::mpsc::unbounded_channel::<String>();
    let printer = rt::spawn(async move {
        while let Some(message) = messages.recv().await {
            tracing::info!("{message}");
        }
    });
    let sink = Arc::new(move |message: &str| {
        let _ = tx.send(message.to_string());
    });

    let simulation = Simulation::start(&config, Some(sink))?;

    let token = simulation.pool().cancellation_token();
    rt::spawn(async move {
        rt::ctrl_c().await;
        tracing::info!("Received Ctrl+C, stopping workers");
        token.cancel();
    });

    let summary = simulation.wait().await?;
    let _ = printer.await;

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
