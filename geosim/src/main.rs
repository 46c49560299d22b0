use anyhow::{Context, Result};
use clap::Parser;
use geosim::Scenario;
use geosim_core::EventLog;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (JSON). Runs the built-in demo world if omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of months to run
    #[arg(short, long, default_value_t = 12)]
    months: u32,

    /// Override the scenario's RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write events as JSON lines to this file instead of stdout
    #[arg(long)]
    events: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    log::info!("Starting geosim...");

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => {
            log::info!("No scenario given, using the demo world");
            Scenario::demo()
        }
    };
    let (mut sim, commands) = scenario.into_simulation(args.seed);

    let mut event_log = match &args.events {
        Some(path) => EventLog::file(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?,
        None => EventLog::stdout(),
    };

    log::info!("Initial date: {} (seed {})", sim.date(), sim.config().seed);

    for month in 0..args.months {
        for scheduled in commands.iter().filter(|c| c.month == month) {
            if !sim.execute(&scheduled.command) {
                log::warn!("Month {}: command had no effect: {:?}", month, scheduled.command);
            }
        }

        sim.process_elections();
        let turn = sim.process_ai_turn();
        let ai_wars = sim.process_ai_vs_ai();
        let report = sim.run_month();
        event_log.record(&sim.drain_events())?;

        log::info!(
            "Month: {} | Treasury: {:.1} | Soldiers: {} | Offensives: {} | AI war events: {}",
            report.date,
            sim.ledger().player.treasury,
            sim.ledger().player.soldiers,
            turn.offensives.len(),
            ai_wars.events.len()
        );
        for achievement in &report.achievements {
            log::info!("Achievement: {} ({})", achievement.name, achievement.description);
        }

        if sim.is_defeated() {
            log::warn!("The player nation has fallen at {}", sim.date());
            break;
        }
    }

    log::info!(
        "Simulation finished at {} | {} events written | territory {:.2}%",
        sim.date(),
        event_log.written(),
        sim.player_territory_percent()
    );

    Ok(())
}
