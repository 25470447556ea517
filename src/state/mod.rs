/// Pure membership/team lifecycle state machine.
pub mod state_machine;
/// Runtime team aggregate and entity conversions.
pub mod team;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::team_store::TeamStore, error::ServiceError,
    services::mailer::MailerHandle,
};

/// Shared handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing the storage handle, configuration, and
/// the per-team serialization gates.
pub struct AppState {
    team_store: RwLock<Option<Arc<dyn TeamStore>>>,
    degraded: watch::Sender<bool>,
    team_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    config: AppConfig,
    mailer: MailerHandle,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, mailer: MailerHandle) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            team_store: RwLock::new(None),
            degraded: degraded_tx,
            team_gates: DashMap::new(),
            config,
            mailer,
        })
    }

    /// Obtain a handle to the current team store, if one is installed.
    pub async fn team_store(&self) -> Option<Arc<dyn TeamStore>> {
        let guard = self.team_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the team store or fail with a degraded-mode error.
    pub async fn require_team_store(&self) -> Result<Arc<dyn TeamStore>, ServiceError> {
        self.team_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new team store implementation and leave degraded mode.
    pub async fn install_team_store(&self, store: Arc<dyn TeamStore>) {
        {
            let mut guard = self.team_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current team store and enter degraded mode.
    pub async fn clear_team_store(&self) {
        {
            let mut guard = self.team_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.team_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Serialization gate for the given team.
    ///
    /// Every mutating team operation locks this gate and re-reads the team
    /// inside the critical section, so status transitions are always computed
    /// from the latest committed state.
    pub fn team_gate(&self, team_id: Uuid) -> Arc<Mutex<()>> {
        self.team_gates
            .entry(team_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Queue handle for outbound invitation emails.
    pub fn mailer(&self) -> &MailerHandle {
        &self.mailer
    }

    /// Update and broadcast the degraded flag when the value changes.
    async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
