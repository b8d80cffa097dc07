// SpaceTraders Mining Automation - Main Entry Point
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use spacetraders_automation::config::DEFAULT_SETTINGS_FILE;
use spacetraders_automation::verbosity::init_logging;
use spacetraders_automation::{Admiral, AutomationConfig, AutomationSettings, TickOutcome};

#[derive(Parser)]
#[command(
    name = "spacetraders-automation",
    about = "Autonomous mining and selling for SpaceTraders ships",
    version,
    propagate_version = true
)]
struct Cli {
    /// Settings file, created with defaults when missing
    #[arg(short, long, global = true, env = "SPACETRADERS_AUTOMATION_CONFIG", default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every started ship until Ctrl-C
    Run,
    /// Create or update a ship's automation config
    Configure {
        ship: String,
        /// Waypoint to extract at
        #[arg(long)]
        mine: Option<String>,
        /// Waypoint to sell at
        #[arg(long)]
        market: Option<String>,
        #[arg(long)]
        trade_symbol: Option<String>,
        /// Units of the trade good that trigger a sale
        #[arg(long, allow_negative_numbers = true)]
        sell_at: Option<i32>,
        /// Polling interval in seconds (minimum 5)
        #[arg(long, allow_negative_numbers = true)]
        interval: Option<i64>,
    },
    /// Start automating a ship, creating a default config if needed
    Start { ship: String },
    /// Stop automating a ship
    Stop { ship: String },
    /// Stop automating every ship
    StopAll,
    /// Show configs, run flags and last results
    Status,
    /// List every ship in the fleet with its automation state
    Ships,
    /// Run a single automation cycle for a ship now
    Tick { ship: String },
}

// Single-threaded: timers only make progress while the daemon is awaiting,
// so one-shot commands never tick a ship on their way out.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = AutomationSettings::load_or_create(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let verbosity = if cli.verbose > 0 { cli.verbose } else { settings.logging.verbosity };
    init_logging(verbosity);
    settings.validate()?;

    let admiral = Admiral::new(settings)?;
    let scheduler = admiral.scheduler();

    match cli.command {
        Commands::Run => {
            info!("🚀 SpaceTraders mining automation starting...");
            admiral.settings().print_summary();
            admiral.report_agent().await?;
            info!("⚠️  Running until Ctrl+C");

            admiral
                .run_continuous_operations(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "❌ Failed to listen for Ctrl+C");
                    }
                })
                .await?;
        }
        Commands::Configure {
            ship,
            mine,
            market,
            trade_symbol,
            sell_at,
            interval,
        } => {
            let mut config = match scheduler.config(&ship) {
                Some(config) => config,
                None => {
                    let snapshot = admiral.client().get_ship(&ship).await?;
                    AutomationConfig::from_ship(&snapshot, &admiral.settings().config_defaults())
                }
            };
            if let Some(mine) = mine {
                config.mine_waypoint = mine;
            }
            if let Some(market) = market {
                config.market_waypoint = market;
            }
            if let Some(trade_symbol) = trade_symbol {
                config.trade_symbol = trade_symbol;
            }
            if let Some(sell_at) = sell_at {
                config.sell_at_units = Some(sell_at);
            }
            if let Some(interval) = interval {
                config.interval_seconds = interval;
            }

            scheduler.upsert_config(config.clone());
            println!("📝 {}", describe_config(&config));
        }
        Commands::Start { ship } => {
            let defaults = admiral.settings().config_defaults();
            let config = scheduler.start_with_defaults(&ship, &defaults).await?;
            println!("▶️  {} started: {}", ship, describe_config(&config));
        }
        Commands::Stop { ship } => {
            scheduler.stop(&ship);
            println!("🛑 {} stopped", ship);
        }
        Commands::StopAll => {
            scheduler.stop_all();
            println!("🛑 All automation stopped");
        }
        Commands::Status => print_status(&admiral),
        Commands::Ships => {
            for line in admiral.fleet_report().await? {
                println!("🚢 {}", line);
            }
        }
        Commands::Tick { ship } => match scheduler.tick(&ship).await {
            TickOutcome::Completed(decision) => println!("🤖 {} [{}] {}", ship, decision.action, decision.message),
            TickOutcome::Failed(error) => println!("❌ {} {}", ship, error),
            TickOutcome::Skipped => println!("⏭️  {} tick already in progress", ship),
        },
    }

    scheduler.shutdown();
    Ok(())
}

fn describe_config(config: &AutomationConfig) -> String {
    let sell_at = config
        .sell_at_units
        .map(|units| units.to_string())
        .unwrap_or_else(|| "full hold".to_string());
    format!(
        "mine {} → sell {} at {} (sell at {}, every {}s)",
        config.trade_symbol,
        config.mine_waypoint,
        config.market_waypoint,
        sell_at,
        config.effective_interval_seconds()
    )
}

fn print_status(admiral: &Admiral) {
    let scheduler = admiral.scheduler();
    let configs = scheduler.configs();
    let statuses = scheduler.statuses();

    let mut ships: Vec<&String> = configs.keys().chain(statuses.keys()).collect();
    ships.sort();
    ships.dedup();

    if ships.is_empty() {
        println!("📭 No automated ships");
        return;
    }

    for ship in ships {
        let state = if scheduler.is_running(ship) { "▶️  running" } else { "⏸️  stopped" };
        println!("🚢 {} {}", ship, state);
        if let Some(config) = configs.get(ship) {
            println!("   📋 {}", describe_config(config));
        }
        if let Some(status) = statuses.get(ship) {
            if let Some(action) = &status.last_action {
                println!("   🤖 {}", action);
            }
            if let Some(error) = &status.last_error {
                println!("   ❌ {}", error);
            }
            if let Some(updated) = status.last_updated {
                println!("   🕒 {}", updated.to_rfc3339());
            }
        }
    }
}
