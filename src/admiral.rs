// Admiral module - long-running automation daemon orchestration
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::{ApiError, SpaceTradersClient};
use crate::config::{AutomationSettings, SettingsError};
use crate::models::{Agent, Ship};
use crate::operations::{AutomationScheduler, CacheInvalidation};
use crate::storage::{JsonFileStore, KeyValueStore};

#[derive(Debug, Error)]
pub enum AdmiralError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct Admiral {
    settings: AutomationSettings,
    client: Arc<SpaceTradersClient>,
    scheduler: AutomationScheduler,
}

impl Admiral {
    /// Builds the API client from the configured token and opens the JSON
    /// store under the configured storage directory.
    pub fn new(settings: AutomationSettings) -> Result<Self, AdmiralError> {
        let token = settings.load_token()?;
        let client = SpaceTradersClient::with_base_url(&token, &settings.api.base_url)?;
        let store = JsonFileStore::new(&settings.storage.directory);
        Ok(Self::with_parts(settings, Arc::new(client), Arc::new(store)))
    }

    pub fn with_parts(
        settings: AutomationSettings,
        client: Arc<SpaceTradersClient>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let scheduler = AutomationScheduler::new(client.clone(), client.clone(), store);
        Self {
            settings,
            client,
            scheduler,
        }
    }

    pub fn settings(&self) -> &AutomationSettings {
        &self.settings
    }

    pub fn client(&self) -> &SpaceTradersClient {
        &self.client
    }

    pub fn scheduler(&self) -> &AutomationScheduler {
        &self.scheduler
    }

    /// Authentication check: fetches and logs the agent.
    pub async fn report_agent(&self) -> Result<Agent, AdmiralError> {
        let agent = self.client.get_agent().await?;
        info!("✅ Successfully authenticated!");
        info!(
            symbol = %agent.symbol,
            headquarters = %agent.headquarters,
            credits = agent.credits,
            ships = agent.ship_count,
            "📊 Agent info"
        );
        Ok(agent)
    }

    /// One line per ship in the fleet, with its automation state.
    pub async fn fleet_report(&self) -> Result<Vec<String>, AdmiralError> {
        let ships = self.client.get_ships().await?;
        Ok(describe_fleet(&ships, &self.scheduler))
    }

    /// Runs every flagged ship until `shutdown` resolves, picking up run
    /// flags and configs written by other processes along the way. Timers
    /// are cancelled on exit; run flags stay set for the next session.
    pub async fn run_continuous_operations<F>(&self, shutdown: F) -> Result<(), AdmiralError>
    where
        F: Future<Output = ()>,
    {
        info!("🎖️  Admiral starting continuous automation...");
        let mut notifications = self.scheduler.subscribe();
        self.scheduler.reconcile();
        info!(ships = ?self.scheduler.active_timers(), "🚀 Automation timers active");

        let sync_period = Duration::from_secs(self.settings.timing.store_sync_interval_seconds.max(1));
        let mut sync = tokio::time::interval_at(tokio::time::Instant::now() + sync_period, sync_period);
        sync.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("🛑 Shutdown requested");
                    break;
                }
                _ = sync.tick() => {
                    self.scheduler.sync_from_store();
                }
                notification = notifications.recv() => match notification {
                    Ok(CacheInvalidation::Ship(ship_symbol)) => {
                        debug!(ship = %ship_symbol, "🔄 Ship view stale");
                    }
                    Ok(CacheInvalidation::Fleet) => {
                        debug!("🔄 Fleet view stale");
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "⚠️ Dropped cache notifications");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        self.scheduler.shutdown();
        info!("🎖️  Admiral reporting: automation timers stopped, run flags kept");
        Ok(())
    }
}

pub fn describe_fleet(ships: &[Ship], scheduler: &AutomationScheduler) -> Vec<String> {
    ships
        .iter()
        .map(|ship| {
            let automation = if scheduler.is_running(&ship.symbol) {
                "running"
            } else if scheduler.config(&ship.symbol).is_some() {
                "stopped"
            } else {
                "manual"
            };
            format!(
                "{} {} at {} | cargo {}/{} | {}",
                ship.symbol,
                ship.nav.status,
                ship.nav.waypoint_symbol,
                ship.cargo.units,
                ship.cargo.capacity,
                automation
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::storage::{write_map, MemoryStore, RUNNING_KEY};
    use std::collections::HashMap;

    fn docked_ship(symbol: &str) -> Ship {
        Ship {
            symbol: symbol.to_string(),
            registration: ShipRegistration {
                name: symbol.to_string(),
                faction_symbol: "COSMIC".to_string(),
                role: "EXCAVATOR".to_string(),
            },
            nav: ShipNav {
                system_symbol: "X1-N5".to_string(),
                waypoint_symbol: "X1-N5-A1".to_string(),
                status: ShipNavStatus::Docked,
                flight_mode: "CRUISE".to_string(),
            },
            cargo: ShipCargo {
                capacity: 40,
                units: 0,
                inventory: Vec::new(),
            },
            cooldown: ShipCooldown {
                ship_symbol: symbol.to_string(),
                total_seconds: 0,
                remaining_seconds: 0,
                expiration: None,
            },
            fuel: ShipFuel {
                current: 100,
                capacity: 100,
            },
        }
    }

    fn offline_admiral(store: Arc<dyn KeyValueStore>) -> Admiral {
        let settings = AutomationSettings::default();
        let client = SpaceTradersClient::with_base_url("test-token", "http://127.0.0.1:9").unwrap();
        Admiral::with_parts(settings, Arc::new(client), store)
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_when_shutdown_resolves() {
        let admiral = offline_admiral(Arc::new(MemoryStore::new()));

        admiral
            .run_continuous_operations(tokio::time::sleep(Duration::from_secs(30)))
            .await
            .unwrap();

        assert!(admiral.scheduler().active_timers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_flags_survive_shutdown() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut running = HashMap::new();
        running.insert("MINER-1".to_string(), true);
        write_map(store.as_ref(), RUNNING_KEY, &running).unwrap();

        let admiral = offline_admiral(store);
        admiral
            .run_continuous_operations(std::future::ready(()))
            .await
            .unwrap();

        assert!(admiral.scheduler().is_running("MINER-1"));
        assert!(admiral.scheduler().active_timers().is_empty());
    }

    #[tokio::test]
    async fn fleet_lines_show_automation_state() {
        let admiral = offline_admiral(Arc::new(MemoryStore::new()));
        let scheduler = admiral.scheduler();
        let defaults = ConfigDefaults::default();
        scheduler.upsert_config(AutomationConfig::from_ship(&docked_ship("MINER-1"), &defaults));
        scheduler.upsert_config(AutomationConfig::from_ship(&docked_ship("MINER-2"), &defaults));
        scheduler.start("MINER-1");
        scheduler.shutdown();

        let ships = [docked_ship("MINER-1"), docked_ship("MINER-2"), docked_ship("SATELLITE-3")];
        let lines = describe_fleet(&ships, scheduler);

        assert_eq!(
            lines,
            vec![
                "MINER-1 DOCKED at X1-N5-A1 | cargo 0/40 | running".to_string(),
                "MINER-2 DOCKED at X1-N5-A1 | cargo 0/40 | stopped".to_string(),
                "SATELLITE-3 DOCKED at X1-N5-A1 | cargo 0/40 | manual".to_string(),
            ]
        );
    }
}
