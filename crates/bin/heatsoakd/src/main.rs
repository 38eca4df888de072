//! # heatsoakd — heatsoak daemon
//!
//! Composition root that wires all adapters together and runs the event loop.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the adapters (job store, virtual thermostats, CSV export)
//! - Construct the zone sequencer, injecting adapters via port traits
//! - Check the configured zones, recover the day in progress, plan the next run
//! - Run the event loop until SIGINT, then close the database
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use heatsoak_adapter_export_csv::CsvReportSink;
use heatsoak_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteJobStore};
use heatsoak_adapter_virtual::{FixedForecast, VirtualClimate, VirtualThermostat};
use heatsoak_app::activity_bus::InProcessActivityBus;
use heatsoak_app::event_loop;
use heatsoak_app::ports::{ActivityPublisher, StoreKeys};
use heatsoak_app::sequencer::{Collaborators, ZoneSequencer};

use crate::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = SqliteJobStore::new(db.pool().clone());

    // Activity bus and adapters
    let bus = Arc::new(InProcessActivityBus::new(256));
    let mut activity = bus.subscribe();
    let climate = virtual_climate(&config, Arc::clone(&bus))?;
    let sink = CsvReportSink::new(&config.report.path);

    let (mut sequencer, mut timers) = ZoneSequencer::new(
        config.sequencer()?,
        store,
        StoreKeys::default(),
        Collaborators {
            actuator: climate,
            forecast: FixedForecast::default(),
            sink,
            modes: config.modes.shared(),
        },
    );

    // Start-up
    sequencer.verify_zones().await?;
    let recovery = sequencer.recover().await?;
    tracing::info!(
        restored = recovery.restored_jobs,
        expired = recovery.expired_jobs,
        repaired = recovery.repaired.len(),
        queued = recovery.queued.len(),
        "recovered persisted state"
    );
    if !sequencer.is_planned() {
        sequencer.plan_day().await?;
    }

    tracing::info!(zones = config.zones.len(), report = %config.report.path, "heatsoakd running");
    event_loop::run(&mut sequencer, &mut timers, &mut activity, shutdown_signal()).await;

    drop(sequencer);
    db.close().await;
    tracing::info!("heatsoakd stopped");
    Ok(())
}

fn virtual_climate<P>(
    config: &Config,
    publisher: P,
) -> Result<VirtualClimate<P>, config::ConfigError>
where
    P: ActivityPublisher + Send + Sync,
{
    let mut climate = VirtualClimate::new(publisher);
    for zone in config.zone_ids()? {
        let temperature = config.simulation.temperature_of(&zone);
        climate = climate.with_thermostat(zone, VirtualThermostat::heating_at(temperature));
    }
    if let Some(outside) = config.simulation.outside_temperature {
        climate = climate.with_outside_temperature(outside);
    }
    Ok(climate)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
