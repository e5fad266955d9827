//! Engine binary for the Magistrate legal simulation.
//!
//! Wires together the world clock, the jurisdiction aggregate, patrol
//! enforcement, and the cadence scheduler, then drives the tick loop.
//! Loads configuration, builds the demo settlement, and runs until an
//! interrupt or the configured tick bound.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `magistrate-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the world and install the log notification channel
//! 4. Build the demo settlement (laws, watch, witnesses, population)
//! 5. Register the three cadence passes on the scheduler
//! 6. Run the tick loop

mod error;
mod settlement;

use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use magistrate_core::{
    Cadence, JusticeWorld, LogChannel, LoggingConfig, MagistrateConfig, OffenseReport, Scheduler,
};
use magistrate_types::OffenseCategory;

use crate::error::EngineError;
use crate::settlement::{Settlement, SettlementConfig};

const CONFIG_FILE: &str = "magistrate-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration loading or settlement setup fails.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    init_logging(&config.logging);

    info!(
        world = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        "magistrate-engine starting"
    );

    let mut world = JusticeWorld::new(&config).map_err(EngineError::from)?;
    world.set_channel(Box::new(LogChannel));

    // The engine keeps its own rng stream for setup and the offense
    // script, forked off the same seed as the world's.
    let mut rng = config
        .world
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    let settlement_config = load_settlement_config()?;
    let settlement = settlement::build_settlement(&mut world, &settlement_config, &mut rng)?;

    let mut scheduler: Scheduler<JusticeWorld> = Scheduler::new();
    let _step = scheduler.register(Cadence::Fast, "patrol-step", |world, _| {
        world.patrol_pass();
    });
    let _muster = scheduler.register(Cadence::Medium, "patrol-muster", |world, tick| {
        let launched = world.muster_pass();
        if !launched.is_empty() {
            info!(tick, launched = launched.len(), "Patrols mustered");
        }
    });
    let _beat = scheduler.register(Cadence::Slow, "justice-heartbeat", |world, tick| {
        let report = world.heartbeat_pass();
        if report.convicted > 0
            || report.released > 0
            || report.bail_forfeits > 0
            || !report.executions.is_empty()
        {
            info!(
                tick,
                convicted = report.convicted,
                released = report.released,
                bail_forfeits = report.bail_forfeits,
                executions = report.executions.len(),
                "Justice heartbeat"
            );
        }
    });

    info!(tasks = scheduler.len(), "Entering tick loop");

    let mut interval = tokio::time::interval(Duration::from_millis(config.world.tick_interval_ms));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            _ = interval.tick() => {}
        }

        let tick = world.advance()?;
        if is_due(tick, settlement_config.offense_interval_ticks) {
            inject_offense(&mut world, &settlement, &mut rng);
        }
        let _ = scheduler.run_due(&mut world, tick);

        if settlement_config.max_ticks.is_some_and(|max| tick >= max) {
            info!(tick, "Tick bound reached, shutting down");
            break;
        }
    }

    info!(
        tick = world.clock().tick(),
        live_patrols = world.controller().live_patrols(),
        "magistrate-engine shutdown complete"
    );
    Ok(())
}

/// Initialize tracing from the logging config. `RUST_LOG` overrides the
/// configured level.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the main configuration from `magistrate-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<MagistrateConfig, EngineError> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        Ok(MagistrateConfig::from_file(path)?)
    } else {
        Ok(MagistrateConfig::default())
    }
}

/// Load the `settlement` section from `magistrate-config.yaml`.
///
/// If the file does not exist or lacks the `settlement` key, defaults
/// are used.
fn load_settlement_config() -> Result<SettlementConfig, EngineError> {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return Ok(SettlementConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Settlement {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| EngineError::Settlement {
            message: format!("failed to parse config YAML: {e}"),
        })?;
    raw.get("settlement").map_or_else(
        || Ok(SettlementConfig::default()),
        |value| {
            serde_yml::from_value(value.clone()).map_err(|e| EngineError::Settlement {
                message: format!("failed to parse settlement config: {e}"),
            })
        },
    )
}

/// Whether a scripted action with the given interval fires on this tick.
const fn is_due(tick: u64, interval: u64) -> bool {
    interval > 0 && matches!(tick.checked_rem(interval), Some(0))
}

/// Report a scripted offense between two random citizens. Thefts
/// dominate; the occasional affray exercises the custodial path.
fn inject_offense(world: &mut JusticeWorld, settlement: &Settlement, rng: &mut StdRng) {
    let count = settlement.citizens.len();
    if count < 2 {
        return;
    }
    let offender_ix = rng.random_range(0..count);
    let mut victim_ix = rng.random_range(0..count);
    if victim_ix == offender_ix {
        victim_ix = victim_ix
            .checked_add(1)
            .and_then(|v| v.checked_rem(count))
            .unwrap_or(0);
    }
    let Some(&offender) = settlement.citizens.get(offender_ix) else {
        return;
    };
    let Some(&victim) = settlement.citizens.get(victim_ix) else {
        return;
    };

    let (category, note) = if rng.random_bool(0.25) {
        (OffenseCategory::Assault, "a brawl broke out by the stalls")
    } else {
        (OffenseCategory::Theft, "a market stall was pilfered")
    };
    let created = world.report_offense(&OffenseReport {
        offender,
        category,
        victim: Some(victim),
        object: None,
        note: note.to_owned(),
    });
    for crime in created {
        if let Some(line) = world.narrate_crime(crime) {
            info!(%crime, "{line}");
        }
    }
}
