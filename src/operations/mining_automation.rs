// Mining automation decision engine
//
// Each tick looks at a fresh ship snapshot and advances the mine -> sell loop
// by exactly one step. Rules are evaluated in order and the first match wins:
// transit, then the selling branch, then the mining branch. Apart from
// transit, each rule names its own location and docking conditions.
use tracing::debug;

use crate::client::ApiResult;
use crate::models::{AutomationConfig, Decision, DecisionAction, Ship};
use crate::operations::ShipCommands;

/// A command the engine wants issued for the ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipCommand {
    Orbit,
    Dock,
    Navigate(String),
    Extract,
    Sell { trade_symbol: String, units: i32 },
}

impl ShipCommand {
    pub async fn issue<C: ShipCommands + ?Sized>(&self, commands: &C) -> ApiResult<()> {
        match self {
            ShipCommand::Orbit => commands.orbit().await,
            ShipCommand::Dock => commands.dock().await,
            ShipCommand::Navigate(waypoint_symbol) => commands.navigate(waypoint_symbol).await,
            ShipCommand::Extract => commands.extract().await,
            ShipCommand::Sell { trade_symbol, units } => commands.sell(trade_symbol, *units).await,
        }
    }
}

/// The step chosen for this tick, before anything is sent to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    /// Name of the rule that produced the step.
    pub rule: &'static str,
    pub command: Option<ShipCommand>,
    pub decision: Decision,
}

impl PlannedStep {
    fn idle(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            command: None,
            decision: Decision::idle(message),
        }
    }

    fn issue(rule: &'static str, command: ShipCommand, action: DecisionAction, message: impl Into<String>) -> Self {
        Self {
            rule,
            command: Some(command),
            decision: Decision::new(action, message),
        }
    }
}

/// Units of `trade_symbol` in the ship's hold.
pub fn trade_units(ship: &Ship, trade_symbol: &str) -> i32 {
    ship.cargo.units_of(trade_symbol)
}

/// True once the hold carries trade goods and is either full or past the
/// configured threshold.
pub fn should_sell_cargo(ship: &Ship, config: &AutomationConfig) -> bool {
    let units = trade_units(ship, &config.trade_symbol);
    let sell_at_units = config.effective_sell_threshold(ship.cargo.capacity);

    units > 0 && (ship.cargo.is_full() || units >= sell_at_units)
}

struct StepContext<'a> {
    ship: &'a Ship,
    config: &'a AutomationConfig,
    at_mine: bool,
    at_market: bool,
    docked: bool,
    should_sell: bool,
}

impl<'a> StepContext<'a> {
    fn new(ship: &'a Ship, config: &'a AutomationConfig) -> Self {
        Self {
            ship,
            config,
            at_mine: ship.is_at(&config.mine_waypoint),
            at_market: ship.is_at(&config.market_waypoint),
            docked: ship.is_docked(),
            should_sell: should_sell_cargo(ship, config),
        }
    }
}

type Rule = fn(&StepContext<'_>) -> Option<PlannedStep>;

const RULES: &[Rule] = &[
    in_transit,
    leave_for_market,
    travel_to_market,
    dock_at_market,
    sell_cargo,
    leave_for_mine,
    travel_to_mine,
    undock_at_mine,
    wait_for_cooldown,
    extract,
];

fn in_transit(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    ctx.ship
        .is_in_transit()
        .then(|| PlannedStep::idle("in_transit", "Ship in transit."))
}

fn leave_for_market(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    (ctx.should_sell && !ctx.at_market && ctx.docked).then(|| {
        PlannedStep::issue(
            "leave_for_market",
            ShipCommand::Orbit,
            DecisionAction::Orbit,
            "Orbiting to travel to market.",
        )
    })
}

fn travel_to_market(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    (ctx.should_sell && !ctx.at_market).then(|| {
        let market = &ctx.config.market_waypoint;
        PlannedStep::issue(
            "travel_to_market",
            ShipCommand::Navigate(market.clone()),
            DecisionAction::Navigate,
            format!("Navigating to market {}.", market),
        )
    })
}

fn dock_at_market(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    (ctx.should_sell && ctx.at_market && !ctx.docked).then(|| {
        PlannedStep::issue(
            "dock_at_market",
            ShipCommand::Dock,
            DecisionAction::Dock,
            "Docking to sell cargo.",
        )
    })
}

fn sell_cargo(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    if !(ctx.should_sell && ctx.at_market && ctx.docked) {
        return None;
    }

    // Re-read the hold right before selling: the whole quantity goes, not
    // just the threshold amount.
    let trade_symbol = &ctx.config.trade_symbol;
    let units = trade_units(ctx.ship, trade_symbol);
    if units <= 0 {
        return Some(PlannedStep::idle("sell_cargo", "No cargo to sell."));
    }

    Some(PlannedStep::issue(
        "sell_cargo",
        ShipCommand::Sell {
            trade_symbol: trade_symbol.clone(),
            units,
        },
        DecisionAction::Sell,
        format!("Selling {} {}.", units, trade_symbol),
    ))
}

fn leave_for_mine(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    (!ctx.should_sell && !ctx.at_mine && ctx.docked).then(|| {
        PlannedStep::issue(
            "leave_for_mine",
            ShipCommand::Orbit,
            DecisionAction::Orbit,
            "Orbiting to travel to mine.",
        )
    })
}

fn travel_to_mine(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    (!ctx.should_sell && !ctx.at_mine).then(|| {
        let mine = &ctx.config.mine_waypoint;
        PlannedStep::issue(
            "travel_to_mine",
            ShipCommand::Navigate(mine.clone()),
            DecisionAction::Navigate,
            format!("Navigating to mine {}.", mine),
        )
    })
}

fn undock_at_mine(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    (!ctx.should_sell && ctx.at_mine && ctx.docked).then(|| {
        PlannedStep::issue(
            "undock_at_mine",
            ShipCommand::Orbit,
            DecisionAction::Orbit,
            "Orbiting to begin mining.",
        )
    })
}

fn wait_for_cooldown(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    let remaining = ctx.ship.cooldown.remaining_seconds;
    (!ctx.should_sell && ctx.at_mine && !ctx.docked && remaining > 0).then(|| PlannedStep::idle("wait_for_cooldown", format!("Cooldown {}s remaining.", remaining)))
}

fn extract(ctx: &StepContext<'_>) -> Option<PlannedStep> {
    let ready = ctx.ship.cooldown.remaining_seconds <= 0;
    (!ctx.should_sell && ctx.at_mine && !ctx.docked && ready).then(|| {
        PlannedStep::issue(
            "extract",
            ShipCommand::Extract,
            DecisionAction::Extract,
            "Extracting resources.",
        )
    })
}

/// Picks the next step for `ship` without touching the API.
pub fn plan_mining_step(ship: &Ship, config: &AutomationConfig) -> PlannedStep {
    let ctx = StepContext::new(ship, config);

    // Outside transit exactly one of the remaining rules matches.
    RULES
        .iter()
        .find_map(|rule| rule(&ctx))
        .unwrap_or_else(|| PlannedStep::idle("none", "No step available."))
}

/// Runs one automation step: plans it, issues at most one command, and
/// reports what was done. Command failures are returned untouched.
pub async fn run_mining_step<C: ShipCommands + ?Sized>(
    ship: &Ship,
    config: &AutomationConfig,
    commands: &C,
) -> ApiResult<Decision> {
    let step = plan_mining_step(ship, config);
    debug!(
        ship = %ship.symbol,
        rule = step.rule,
        action = %step.decision.action,
        "🧭 Automation step planned"
    );

    if let Some(command) = &step.command {
        command.issue(commands).await?;
    }

    Ok(step.decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiError;
    use crate::models::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const MINE: &str = "X1-N5-B7";
    const MARKET: &str = "X1-N5-A1";

    #[derive(Default)]
    struct RecordingCommands {
        issued: Mutex<Vec<ShipCommand>>,
        fail_with: Option<String>,
    }

    impl RecordingCommands {
        fn failing(message: &str) -> Self {
            Self {
                issued: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
            }
        }

        fn record(&self, command: ShipCommand) -> ApiResult<()> {
            self.issued.lock().unwrap().push(command);
            match &self.fail_with {
                Some(message) => Err(ApiError::Rejected(message.clone())),
                None => Ok(()),
            }
        }

        fn issued(&self) -> Vec<ShipCommand> {
            self.issued.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ShipCommands for RecordingCommands {
        async fn dock(&self) -> ApiResult<()> {
            self.record(ShipCommand::Dock)
        }

        async fn orbit(&self) -> ApiResult<()> {
            self.record(ShipCommand::Orbit)
        }

        async fn navigate(&self, waypoint_symbol: &str) -> ApiResult<()> {
            self.record(ShipCommand::Navigate(waypoint_symbol.to_string()))
        }

        async fn extract(&self) -> ApiResult<()> {
            self.record(ShipCommand::Extract)
        }

        async fn sell(&self, trade_symbol: &str, units: i32) -> ApiResult<()> {
            self.record(ShipCommand::Sell {
                trade_symbol: trade_symbol.to_string(),
                units,
            })
        }
    }

    fn config(sell_at_units: Option<i32>) -> AutomationConfig {
        AutomationConfig {
            ship_symbol: "MINER-1".to_string(),
            mine_waypoint: MINE.to_string(),
            market_waypoint: MARKET.to_string(),
            trade_symbol: "IRON_ORE".to_string(),
            sell_at_units,
            interval_seconds: 15,
        }
    }

    fn ship(waypoint: &str, status: ShipNavStatus, cargo: &[(&str, i32)], capacity: i32, cooldown: i32) -> Ship {
        let inventory: Vec<CargoItem> = cargo
            .iter()
            .map(|(symbol, units)| CargoItem {
                symbol: symbol.to_string(),
                name: symbol.to_string(),
                description: String::new(),
                units: *units,
            })
            .collect();

        Ship {
            symbol: "MINER-1".to_string(),
            registration: ShipRegistration {
                name: "MINER-1".to_string(),
                faction_symbol: "COSMIC".to_string(),
                role: "EXCAVATOR".to_string(),
            },
            nav: ShipNav {
                system_symbol: "X1-N5".to_string(),
                waypoint_symbol: waypoint.to_string(),
                status,
                flight_mode: "CRUISE".to_string(),
            },
            cargo: ShipCargo {
                capacity,
                units: inventory.iter().map(|item| item.units).sum(),
                inventory,
            },
            cooldown: ShipCooldown {
                ship_symbol: "MINER-1".to_string(),
                total_seconds: 70,
                remaining_seconds: cooldown,
                expiration: None,
            },
            fuel: ShipFuel {
                current: 100,
                capacity: 100,
            },
        }
    }

    #[tokio::test]
    async fn in_transit_ship_is_left_alone() {
        let full_hold = [("IRON_ORE", 40)];
        let cases = [
            ship(MINE, ShipNavStatus::InTransit, &[], 40, 0),
            ship(MARKET, ShipNavStatus::InTransit, &full_hold, 40, 0),
            ship("X1-N5-Z9", ShipNavStatus::InTransit, &[("IRON_ORE", 5)], 40, 30),
        ];

        for snapshot in &cases {
            for threshold in [None, Some(1), Some(-5)] {
                let commands = RecordingCommands::default();
                let decision = run_mining_step(snapshot, &config(threshold), &commands).await.unwrap();

                assert_eq!(decision, Decision::idle("Ship in transit."));
                assert!(commands.issued().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn ready_to_sell_in_orbit_away_from_market_navigates_once() {
        let snapshot = ship(MINE, ShipNavStatus::InOrbit, &[("IRON_ORE", 20)], 40, 0);
        let commands = RecordingCommands::default();

        let decision = run_mining_step(&snapshot, &config(Some(20)), &commands).await.unwrap();

        assert_eq!(decision.action, DecisionAction::Navigate);
        assert_eq!(decision.message, format!("Navigating to market {}.", MARKET));
        assert_eq!(commands.issued(), vec![ShipCommand::Navigate(MARKET.to_string())]);
    }

    #[tokio::test]
    async fn full_hold_triggers_sale_regardless_of_threshold() {
        let snapshot = ship(MINE, ShipNavStatus::InOrbit, &[("IRON_ORE", 50)], 50, 0);

        for threshold in [None, Some(500), Some(50), Some(0)] {
            let commands = RecordingCommands::default();
            let decision = run_mining_step(&snapshot, &config(threshold), &commands).await.unwrap();

            assert_eq!(decision.action, DecisionAction::Navigate);
            assert_eq!(commands.issued(), vec![ShipCommand::Navigate(MARKET.to_string())]);
        }
    }

    #[tokio::test]
    async fn full_hold_of_other_goods_keeps_mining() {
        let snapshot = ship(MINE, ShipNavStatus::InOrbit, &[("ICE_WATER", 40)], 40, 0);
        let commands = RecordingCommands::default();

        let decision = run_mining_step(&snapshot, &config(Some(1)), &commands).await.unwrap();

        assert_eq!(decision.action, DecisionAction::Extract);
        assert_eq!(commands.issued(), vec![ShipCommand::Extract]);
    }

    #[test]
    fn zero_and_negative_thresholds_behave_identically() {
        let snapshots = [
            ship(MINE, ShipNavStatus::InOrbit, &[("IRON_ORE", 1)], 40, 0),
            ship(MINE, ShipNavStatus::Docked, &[("IRON_ORE", 3)], 40, 0),
            ship(MARKET, ShipNavStatus::Docked, &[("IRON_ORE", 7)], 40, 0),
            ship(MINE, ShipNavStatus::InOrbit, &[], 40, 10),
        ];

        for snapshot in &snapshots {
            let zero = plan_mining_step(snapshot, &config(Some(0)));
            let negative = plan_mining_step(snapshot, &config(Some(-5)));
            let one = plan_mining_step(snapshot, &config(Some(1)));
            assert_eq!(zero, negative);
            assert_eq!(zero, one);
        }
    }

    #[test]
    fn selling_branch_walks_orbit_navigate_dock_sell() {
        let cfg = config(Some(10));
        let cargo = [("IRON_ORE", 12)];

        let docked_at_mine = ship(MINE, ShipNavStatus::Docked, &cargo, 40, 0);
        let step = plan_mining_step(&docked_at_mine, &cfg);
        assert_eq!(step.rule, "leave_for_market");
        assert_eq!(step.command, Some(ShipCommand::Orbit));
        assert_eq!(step.decision.message, "Orbiting to travel to market.");

        let orbiting_at_mine = ship(MINE, ShipNavStatus::InOrbit, &cargo, 40, 0);
        assert_eq!(plan_mining_step(&orbiting_at_mine, &cfg).rule, "travel_to_market");

        let orbiting_at_market = ship(MARKET, ShipNavStatus::InOrbit, &cargo, 40, 0);
        let step = plan_mining_step(&orbiting_at_market, &cfg);
        assert_eq!(step.command, Some(ShipCommand::Dock));
        assert_eq!(step.decision, Decision::new(DecisionAction::Dock, "Docking to sell cargo."));

        let docked_at_market = ship(MARKET, ShipNavStatus::Docked, &cargo, 40, 0);
        let step = plan_mining_step(&docked_at_market, &cfg);
        assert_eq!(step.rule, "sell_cargo");
        assert_eq!(step.decision.message, "Selling 12 IRON_ORE.");
    }

    #[tokio::test]
    async fn docked_at_market_sells_entire_held_quantity() {
        let snapshot = ship(MARKET, ShipNavStatus::Docked, &[("IRON_ORE", 37), ("ICE_WATER", 3)], 40, 0);
        let commands = RecordingCommands::default();

        let decision = run_mining_step(&snapshot, &config(Some(20)), &commands).await.unwrap();

        assert_eq!(decision, Decision::new(DecisionAction::Sell, "Selling 37 IRON_ORE."));
        assert_eq!(
            commands.issued(),
            vec![ShipCommand::Sell {
                trade_symbol: "IRON_ORE".to_string(),
                units: 37,
            }]
        );
    }

    #[tokio::test]
    async fn mining_cycle_orbits_extracts_then_waits_for_cooldown() {
        let cfg = config(None);
        let commands = RecordingCommands::default();

        let docked = ship(MINE, ShipNavStatus::Docked, &[], 40, 0);
        let first = run_mining_step(&docked, &cfg, &commands).await.unwrap();
        assert_eq!(first, Decision::new(DecisionAction::Orbit, "Orbiting to begin mining."));

        let orbiting = ship(MINE, ShipNavStatus::InOrbit, &[], 40, 0);
        let second = run_mining_step(&orbiting, &cfg, &commands).await.unwrap();
        assert_eq!(second, Decision::new(DecisionAction::Extract, "Extracting resources."));

        let cooling = ship(MINE, ShipNavStatus::InOrbit, &[("IRON_ORE", 6)], 40, 42);
        let third = run_mining_step(&cooling, &cfg, &commands).await.unwrap();
        assert_eq!(third, Decision::idle("Cooldown 42s remaining."));

        let ready = ship(MINE, ShipNavStatus::InOrbit, &[("IRON_ORE", 6)], 40, 0);
        let fourth = run_mining_step(&ready, &cfg, &commands).await.unwrap();
        assert_eq!(fourth.action, DecisionAction::Extract);

        assert_eq!(
            commands.issued(),
            vec![ShipCommand::Orbit, ShipCommand::Extract, ShipCommand::Extract]
        );
    }

    #[test]
    fn mining_branch_returns_to_mine_from_elsewhere() {
        let cfg = config(None);

        let docked_at_market = ship(MARKET, ShipNavStatus::Docked, &[], 40, 0);
        let step = plan_mining_step(&docked_at_market, &cfg);
        assert_eq!(step.command, Some(ShipCommand::Orbit));
        assert_eq!(step.decision.message, "Orbiting to travel to mine.");

        let orbiting_at_market = ship(MARKET, ShipNavStatus::InOrbit, &[], 40, 0);
        let step = plan_mining_step(&orbiting_at_market, &cfg);
        assert_eq!(step.command, Some(ShipCommand::Navigate(MINE.to_string())));
        assert_eq!(step.decision.message, format!("Navigating to mine {}.", MINE));
    }

    #[test]
    fn below_threshold_cargo_keeps_mining() {
        let snapshot = ship(MINE, ShipNavStatus::InOrbit, &[("IRON_ORE", 9)], 40, 0);
        let step = plan_mining_step(&snapshot, &config(Some(10)));
        assert_eq!(step.rule, "extract");
    }

    #[test]
    fn every_settled_state_matches_exactly_one_rule() {
        let mut same_site = config(Some(10));
        same_site.market_waypoint = MINE.to_string();
        let full_hold = [("IRON_ORE", 40)];
        let holds: [&[(&str, i32)]; 2] = [&[], &full_hold];

        for cfg in [config(Some(10)), same_site] {
            for waypoint in [MINE, MARKET, "X1-N5-Z9"] {
                for status in [ShipNavStatus::Docked, ShipNavStatus::InOrbit, ShipNavStatus::Unknown] {
                    for hold in holds {
                        for cooldown in [0, 30] {
                            let snapshot = ship(waypoint, status, hold, 40, cooldown);
                            let ctx = StepContext::new(&snapshot, &cfg);
                            let matched: Vec<&'static str> =
                                RULES.iter().filter_map(|rule| rule(&ctx)).map(|step| step.rule).collect();

                            assert_eq!(
                                matched.len(),
                                1,
                                "{} {} hold={:?} cooldown={} matched {:?}",
                                waypoint,
                                status,
                                hold,
                                cooldown,
                                matched
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn waypoint_match_is_exact() {
        let snapshot = ship("x1-n5-b7", ShipNavStatus::InOrbit, &[], 40, 0);
        let step = plan_mining_step(&snapshot, &config(None));
        assert_eq!(step.rule, "travel_to_mine");
    }

    #[tokio::test]
    async fn command_failure_propagates_after_single_attempt() {
        let snapshot = ship(MINE, ShipNavStatus::InOrbit, &[], 40, 0);
        let commands = RecordingCommands::failing("ship is not at a minable site");

        let result = run_mining_step(&snapshot, &config(None), &commands).await;

        let error = result.unwrap_err();
        assert_eq!(error.to_string(), "ship is not at a minable site");
        assert_eq!(commands.issued(), vec![ShipCommand::Extract]);
    }
}
