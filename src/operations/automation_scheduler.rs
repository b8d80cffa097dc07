// Automation Scheduler - one polling timer per automated ship
//
// Owns the durable automation book (configs, run flags, status), keeps exactly
// one timer alive per running ship, and turns every tick into a status record.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::{ApiResult, ShipCommandApi, ShipStateProvider};
use crate::models::{AutomationConfig, AutomationStatus, ConfigDefaults, Decision};
use crate::operations::{run_mining_step, ShipOperations};
use crate::storage::{read_map, write_map, KeyValueStore, CONFIGS_KEY, RUNNING_KEY, STATUS_KEY};

pub const MISSING_CONFIG_MESSAGE: &str = "Missing automation config.";

const NOTIFICATION_CAPACITY: usize = 64;

/// Cached views that went stale after a successful tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheInvalidation {
    Ship(String),
    Fleet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A tick for the same ship was still running.
    Skipped,
    Completed(Decision),
    Failed(String),
}

#[derive(Default)]
struct AutomationBook {
    configs: HashMap<String, AutomationConfig>,
    running: HashMap<String, bool>,
    status: HashMap<String, AutomationStatus>,
}

struct ShipTimer {
    period: Duration,
    handle: JoinHandle<()>,
}

struct SchedulerCore {
    commands: Arc<dyn ShipCommandApi>,
    provider: Arc<dyn ShipStateProvider>,
    store: Arc<dyn KeyValueStore>,
    book: Mutex<AutomationBook>,
    timers: Mutex<HashMap<String, ShipTimer>>,
    in_flight: Mutex<HashSet<String>>,
    notifications: broadcast::Sender<CacheInvalidation>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a ship as having a tick in progress; released on drop, whichever
/// way the tick ends.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    ship_symbol: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<String>>, ship_symbol: &str) -> Option<Self> {
        if !lock(in_flight).insert(ship_symbol.to_string()) {
            return None;
        }
        Some(Self {
            in_flight,
            ship_symbol: ship_symbol.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.ship_symbol);
    }
}

impl SchedulerCore {
    fn persist<T: Serialize>(&self, key: &str, map: &HashMap<String, T>) {
        if let Err(e) = write_map(self.store.as_ref(), key, map) {
            warn!(key, error = %e, "⚠️ Failed to persist automation state");
        }
    }

    fn config(&self, ship_symbol: &str) -> Option<AutomationConfig> {
        lock(&self.book).configs.get(ship_symbol).cloned()
    }

    /// Updates one ship's status. Entries other processes stored for other
    /// ships since the last write are merged in first, so they survive it.
    fn update_status(&self, ship_symbol: &str, update: impl FnOnce(&mut AutomationStatus)) {
        let mut book = lock(&self.book);
        let stored: HashMap<String, AutomationStatus> = read_map(self.store.as_ref(), STATUS_KEY);
        for (other, status) in stored {
            if other != ship_symbol {
                book.status.insert(other, status);
            }
        }
        update(book.status.entry(ship_symbol.to_string()).or_default());
        self.persist(STATUS_KEY, &book.status);
    }

    fn record_failure(&self, ship_symbol: &str, message: &str) {
        self.update_status(ship_symbol, |status| status.record_failure(message, Utc::now()));
    }

    fn cancel_timer(&self, ship_symbol: &str) {
        if let Some(timer) = lock(&self.timers).remove(ship_symbol) {
            timer.handle.abort();
            info!(ship = ship_symbol, "🛑 Automation timer stopped");
        }
    }

    fn cancel_all_timers(&self) {
        let mut timers = lock(&self.timers);
        for (ship_symbol, timer) in timers.drain() {
            timer.handle.abort();
            debug!(ship = %ship_symbol, "🛑 Automation timer stopped");
        }
    }

    async fn tick(&self, ship_symbol: &str) -> TickOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, ship_symbol) else {
            debug!(ship = ship_symbol, "⏭️ Previous tick still running, skipping");
            return TickOutcome::Skipped;
        };

        let Some(config) = self.config(ship_symbol) else {
            warn!(ship = ship_symbol, "⚠️ {}", MISSING_CONFIG_MESSAGE);
            self.record_failure(ship_symbol, MISSING_CONFIG_MESSAGE);
            return TickOutcome::Failed(MISSING_CONFIG_MESSAGE.to_string());
        };

        match self.advance(ship_symbol, &config).await {
            Ok(decision) => {
                info!(ship = ship_symbol, action = %decision.action, "🤖 {}", decision.message);
                self.update_status(ship_symbol, |status| status.record_success(&decision.message, Utc::now()));

                let _ = self.notifications.send(CacheInvalidation::Ship(ship_symbol.to_string()));
                let _ = self.notifications.send(CacheInvalidation::Fleet);
                TickOutcome::Completed(decision)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(ship = ship_symbol, error = %message, "❌ Automation tick failed");
                self.record_failure(ship_symbol, &message);
                TickOutcome::Failed(message)
            }
        }
    }

    /// Tick fired by a timer. The ship may have been stopped (or the
    /// scheduler shut down) between the firing and this task first running.
    async fn scheduled_tick(&self, ship_symbol: &str) -> Option<TickOutcome> {
        if !lock(&self.timers).contains_key(ship_symbol) {
            debug!(ship = ship_symbol, "⏭️ Timer cancelled before tick ran");
            return None;
        }
        Some(self.tick(ship_symbol).await)
    }

    async fn advance(&self, ship_symbol: &str, config: &AutomationConfig) -> ApiResult<Decision> {
        let ship = self.provider.fetch_ship(ship_symbol).await?;
        let commands = ShipOperations::new(ship_symbol, self.commands.as_ref());
        run_mining_step(&ship, config, &commands).await
    }
}

impl Drop for SchedulerCore {
    fn drop(&mut self) {
        self.cancel_all_timers();
    }
}

/// Drives mining automation for any number of ships.
///
/// Every ship with a run flag and a config gets its own timer; timers fire
/// one tick immediately and then every `max(5, intervalSeconds)` seconds.
/// Ticks for the same ship never overlap: a tick that fires while the
/// previous one is still waiting on the API is dropped.
///
/// Timers are Tokio tasks, so the mutating methods must be called from
/// within a Tokio runtime.
#[derive(Clone)]
pub struct AutomationScheduler {
    core: Arc<SchedulerCore>,
}

impl AutomationScheduler {
    /// Loads configs, run flags and status from `store`. No timer is started
    /// until [`reconcile`](Self::reconcile) runs.
    pub fn new(
        commands: Arc<dyn ShipCommandApi>,
        provider: Arc<dyn ShipStateProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let book = AutomationBook {
            configs: read_map(store.as_ref(), CONFIGS_KEY),
            running: read_map(store.as_ref(), RUNNING_KEY),
            status: read_map(store.as_ref(), STATUS_KEY),
        };
        info!(
            configs = book.configs.len(),
            running = book.running.values().filter(|running| **running).count(),
            "💾 Loaded automation state"
        );

        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Self {
            core: Arc::new(SchedulerCore {
                commands,
                provider,
                store,
                book: Mutex::new(book),
                timers: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashSet::new()),
                notifications,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheInvalidation> {
        self.core.notifications.subscribe()
    }

    pub fn upsert_config(&self, config: AutomationConfig) {
        {
            let mut book = lock(&self.core.book);
            info!(
                ship = %config.ship_symbol,
                mine = %config.mine_waypoint,
                market = %config.market_waypoint,
                trade_symbol = %config.trade_symbol,
                "📝 Automation config saved"
            );
            book.configs.insert(config.ship_symbol.clone(), config);
            self.core.persist(CONFIGS_KEY, &book.configs);
        }
        self.reconcile();
    }

    pub fn start(&self, ship_symbol: &str) {
        {
            let mut book = lock(&self.core.book);
            book.running.insert(ship_symbol.to_string(), true);
            self.core.persist(RUNNING_KEY, &book.running);
        }
        info!(ship = ship_symbol, "▶️ Automation started");
        self.reconcile();
    }

    /// Starts a ship, first creating its config from the ship's current
    /// position and hold size if it has none. An existing config is saved
    /// again unchanged.
    pub async fn start_with_defaults(
        &self,
        ship_symbol: &str,
        defaults: &ConfigDefaults,
    ) -> ApiResult<AutomationConfig> {
        let config = match self.config(ship_symbol) {
            Some(config) => config,
            None => {
                let ship = self.core.provider.fetch_ship(ship_symbol).await?;
                AutomationConfig::from_ship(&ship, defaults)
            }
        };

        self.upsert_config(config.clone());
        self.start(ship_symbol);
        Ok(config)
    }

    /// Clears the run flag and cancels the timer. A tick already talking to
    /// the API finishes on its own.
    pub fn stop(&self, ship_symbol: &str) {
        {
            let mut book = lock(&self.core.book);
            book.running.insert(ship_symbol.to_string(), false);
            self.core.persist(RUNNING_KEY, &book.running);
        }
        self.core.cancel_timer(ship_symbol);
    }

    pub fn stop_all(&self) {
        {
            let mut book = lock(&self.core.book);
            book.running.clear();
            self.core.persist(RUNNING_KEY, &book.running);
        }
        self.core.cancel_all_timers();
        info!("🛑 All automation stopped");
    }

    /// Cancels every timer but keeps run flags, so the next session picks
    /// the same ships back up.
    pub fn shutdown(&self) {
        self.core.cancel_all_timers();
    }

    /// Makes the timer table match the book: one timer per running ship with
    /// a config, at that config's effective interval. Safe to call at any
    /// time; a timer whose interval changed is replaced.
    pub fn reconcile(&self) {
        let (desired, unconfigured) = {
            let book = lock(&self.core.book);
            let mut desired = HashMap::new();
            let mut unconfigured = Vec::new();

            for (ship_symbol, _) in book.running.iter().filter(|(_, running)| **running) {
                match book.configs.get(ship_symbol) {
                    Some(config) => {
                        desired.insert(ship_symbol.clone(), config.effective_interval());
                    }
                    None => {
                        let already_reported = book
                            .status
                            .get(ship_symbol)
                            .and_then(|status| status.last_error.as_deref())
                            == Some(MISSING_CONFIG_MESSAGE);
                        if !already_reported {
                            unconfigured.push(ship_symbol.clone());
                        }
                    }
                }
            }
            (desired, unconfigured)
        };

        for ship_symbol in unconfigured {
            warn!(ship = %ship_symbol, "⚠️ Run flag set without an automation config");
            self.core.record_failure(&ship_symbol, MISSING_CONFIG_MESSAGE);
        }

        let mut timers = lock(&self.core.timers);
        timers.retain(|ship_symbol, timer| {
            let keep = desired.get(ship_symbol) == Some(&timer.period);
            if !keep {
                timer.handle.abort();
                debug!(ship = %ship_symbol, "🛑 Automation timer replaced or stopped");
            }
            keep
        });

        for (ship_symbol, period) in desired {
            if timers.contains_key(&ship_symbol) {
                continue;
            }
            info!(ship = %ship_symbol, interval_secs = period.as_secs(), "⏱️ Automation timer started");
            let handle = self.spawn_timer(ship_symbol.clone(), period);
            timers.insert(ship_symbol, ShipTimer { period, handle });
        }
    }

    fn spawn_timer(&self, ship_symbol: String, period: Duration) -> JoinHandle<()> {
        let core: Weak<SchedulerCore> = Arc::downgrade(&self.core);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // First tick completes immediately.
                ticker.tick().await;
                let Some(core) = core.upgrade() else {
                    break;
                };
                let ship_symbol = ship_symbol.clone();
                tokio::spawn(async move {
                    core.scheduled_tick(&ship_symbol).await;
                });
            }
        })
    }

    /// Reloads configs, run flags and status written by another process
    /// (the CLI) and reconciles.
    pub fn sync_from_store(&self) {
        {
            let store = self.core.store.as_ref();
            let configs: HashMap<String, AutomationConfig> = read_map(store, CONFIGS_KEY);
            let running: HashMap<String, bool> = read_map(store, RUNNING_KEY);
            let status: HashMap<String, AutomationStatus> = read_map(store, STATUS_KEY);

            let mut book = lock(&self.core.book);
            if book.configs != configs || book.running != running {
                debug!(configs = configs.len(), "🔄 Automation state changed on disk");
            }
            book.configs = configs;
            book.running = running;
            book.status.extend(status);
        }

        self.reconcile();
    }

    /// Runs one automation cycle for `ship_symbol` right now.
    pub async fn tick(&self, ship_symbol: &str) -> TickOutcome {
        self.core.tick(ship_symbol).await
    }

    pub fn config(&self, ship_symbol: &str) -> Option<AutomationConfig> {
        self.core.config(ship_symbol)
    }

    pub fn configs(&self) -> HashMap<String, AutomationConfig> {
        lock(&self.core.book).configs.clone()
    }

    pub fn is_running(&self, ship_symbol: &str) -> bool {
        lock(&self.core.book)
            .running
            .get(ship_symbol)
            .copied()
            .unwrap_or(false)
    }

    pub fn running(&self) -> HashMap<String, bool> {
        lock(&self.core.book).running.clone()
    }

    pub fn status(&self, ship_symbol: &str) -> Option<AutomationStatus> {
        lock(&self.core.book).status.get(ship_symbol).cloned()
    }

    pub fn statuses(&self) -> HashMap<String, AutomationStatus> {
        lock(&self.core.book).status.clone()
    }

    /// Ships that currently have a live timer, sorted.
    pub fn active_timers(&self) -> Vec<String> {
        let mut ships: Vec<String> = lock(&self.core.timers).keys().cloned().collect();
        ships.sort();
        ships
    }
}
