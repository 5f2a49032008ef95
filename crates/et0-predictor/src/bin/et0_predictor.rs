//! ET0 prediction service
//!
//! Usage:
//!   et0-predictor                      # Run the hourly loop with default paths
//!   et0-predictor -c config.yaml       # Load settings from a YAML file
//!   et0-predictor --once               # Run a single cycle and exit
//!   et0-predictor --init-db            # Create the database schema and exit

use anyhow::Context;
use argh::FromArgs;
use et0_predictor::scheduler::run_scheduler;
use et0_predictor::{
    Clock, Config, LinearRegressor, Pipeline, Predictor, SqliteStore, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(FromArgs)]
/// Hourly ET0 prediction from weather-station readings
struct Args {
    /// path to the configuration file (optional, uses defaults)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// database path (overrides the config file)
    #[argh(option)]
    database: Option<PathBuf>,

    /// model artifact path (overrides the config file)
    #[argh(option)]
    model: Option<PathBuf>,

    /// run a single cycle and exit
    #[argh(switch)]
    once: bool,

    /// create the database schema and exit
    #[argh(switch)]
    init_db: bool,

    /// show version information
    #[argh(switch, short = 'V')]
    version: bool,
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => {
            log::info!("No config file specified, using defaults");
            Config::default()
        }
    };
    if let Some(database) = &args.database {
        config.database = database.clone();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();

    if args.version {
        println!("et0-predictor {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(&args)?;

    let store = SqliteStore::open(&config.database)
        .with_context(|| format!("Failed to open database '{}'", config.database.display()))?;
    log::info!("Using database: {}", store.path().display());

    if args.init_db {
        log::info!("Schema ready, exiting");
        return Ok(());
    }

    let model = LinearRegressor::from_file(&config.model)
        .with_context(|| format!("Failed to load model '{}'", config.model.display()))?;
    let predictor = Predictor::new(Arc::new(model))?;
    log::info!("Model loaded from {}", config.model.display());

    let pipeline = Pipeline::new(store, predictor, config.operation_timeout());
    let clock = SystemClock;

    if args.once {
        let outcome = pipeline.run_cycle(clock.now()).await?;
        log::info!("{}", outcome);
        return Ok(());
    }

    // Create shutdown channel
    let shutdown_tx = tokio::sync::watch::Sender::new(());

    // Set up Ctrl+C handler
    {
        let shutdown_tx = shutdown_tx.clone();
        ctrlc::set_handler(move || {
            log::info!("Received Ctrl+C, shutting down gracefully...");
            let _ = shutdown_tx.send(());
        })
        .context("Error setting Ctrl+C handler")?;
    }

    run_scheduler(&pipeline, &clock, config.wake_offset(), shutdown_tx.subscribe()).await;

    log::info!("ET0 predictor shut down, exiting");
    Ok(())
}
