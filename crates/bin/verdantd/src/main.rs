//! # verdantd: verdant daemon
//!
//! Composition root that wires all adapters together and runs the scheduler.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Populate the plugin registry
//! - Register one cron job per enabled schedule
//! - Register the bound checker when a grow is tracked
//! - Stop every job on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use verdant_adapter_recipe_toml::TomlRecipe;
use verdant_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteDeviceRepository, SqliteExportLogRepository,
    SqliteGrowRepository, SqliteMetricRepository, SqliteScheduleRepository,
    SqliteTriggerRepository,
};
use verdant_app::bound_controller::BoundController;
use verdant_app::device_loader::DeviceLoader;
use verdant_app::dispatcher::TaskDispatcher;
use verdant_app::job_scheduler::{JobScheduler, ScheduleRunner};
use verdant_app::plugin_registry::PluginRegistry;
use verdant_app::schedule_resolver::ScheduleResolver;
use verdant_app::services::grow_service::GrowService;
use verdant_app::services::metric_service::MetricService;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let pool = db.pool().clone();

    // Repositories
    let devices = SqliteDeviceRepository::new(pool.clone());
    let schedules = SqliteScheduleRepository::new(pool.clone());
    let metrics = SqliteMetricRepository::new(pool.clone());
    let triggers = SqliteTriggerRepository::new(pool.clone());
    let exports = SqliteExportLogRepository::new(pool.clone());
    let grows = SqliteGrowRepository::new(pool);

    // Plugins
    let mut registry = PluginRegistry::new();
    if config.integrations.virtual_enabled {
        let recorder = MetricService::new(metrics.clone(), config.metrics.temperature_unit);
        verdant_adapter_virtual::register(&mut registry, Arc::new(recorder));
    }
    tracing::info!(plugins = ?registry.keys(), "plugin registry ready");
    let registry = Arc::new(registry);

    // Schedules
    let mut scheduler = JobScheduler::new();
    let runner = Arc::new(ScheduleRunner::new(
        DeviceLoader::new(devices.clone(), Arc::clone(&registry)),
        TaskDispatcher::new(exports),
    ));
    for plan in ScheduleResolver::new(schedules).resolve().await? {
        let name = plan.schedule.name.clone();
        if let Err(error) = scheduler.register_schedule(plan, Arc::clone(&runner)) {
            tracing::error!(schedule = %name, %error, "schedule skipped");
        }
    }

    // Bound checker
    let recipe = config
        .recipe
        .path
        .as_ref()
        .map(TomlRecipe::load)
        .transpose()
        .context("failed to load recipe")?;
    let grow = GrowService::new(grows).tracked(recipe.is_some()).await?;
    match (grow, recipe) {
        (Some(grow), Some(recipe)) => {
            let period = config.bound_check_period();
            let controller = BoundController::new(metrics, period);
            let loader = DeviceLoader::new(devices, Arc::clone(&registry));
            let state = controller.load(&triggers, &loader, &recipe, &grow).await?;
            scheduler.register_bound_checker(period, controller, state)?;
        }
        _ => tracing::info!("no tracked grow, bound checker not registered"),
    }

    tracing::info!(jobs = scheduler.job_count(), "verdantd running");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested");
    scheduler.shutdown();

    Ok(())
}
