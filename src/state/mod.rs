use std::{future::Future, sync::Arc};

use tokio::sync::{RwLock, watch};
use tokio::time::timeout;

use crate::{
    config::AppConfig,
    dao::{
        bank_store::{PlayHistoryStore, QuestionStore},
        storage::StorageResult,
    },
    error::ServiceError,
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing the installed storage backends and the
/// runtime configuration.
pub struct AppState {
    question_store: RwLock<Option<Arc<dyn QuestionStore>>>,
    play_history: RwLock<Option<Arc<dyn PlayHistoryStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    admin_token: Option<String>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, admin_token: Option<String>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            question_store: RwLock::new(None),
            play_history: RwLock::new(None),
            degraded: degraded_tx,
            config,
            admin_token,
        })
    }

    /// Runtime configuration shared across the application.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Expected admin token for mutating routes, if one is configured.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    /// Obtain a handle to the current question store, if one is installed.
    pub async fn question_store(&self) -> Option<Arc<dyn QuestionStore>> {
        let guard = self.question_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the question store or fail with a degraded-mode error.
    pub async fn require_question_store(&self) -> Result<Arc<dyn QuestionStore>, ServiceError> {
        self.question_store().await.ok_or(ServiceError::Degraded)
    }

    /// Obtain the play-history store or fail with a degraded-mode error.
    pub async fn require_play_history(&self) -> Result<Arc<dyn PlayHistoryStore>, ServiceError> {
        let guard = self.play_history.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Install storage backends and leave degraded mode.
    pub async fn install_stores(
        &self,
        questions: Arc<dyn QuestionStore>,
        plays: Arc<dyn PlayHistoryStore>,
    ) {
        {
            let mut guard = self.question_store.write().await;
            *guard = Some(questions);
        }
        {
            let mut guard = self.play_history.write().await;
            *guard = Some(plays);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current storage backends and enter degraded mode.
    pub async fn clear_stores(&self) {
        {
            let mut guard = self.question_store.write().await;
            guard.take();
        }
        {
            let mut guard = self.play_history.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.question_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag.
    pub async fn update_degraded(&self, value: bool) {
        let _ = self.degraded.send(value);
    }

    /// Run a storage operation under the configured timeout.
    ///
    /// Elapsed timers surface as [`ServiceError::Timeout`] so no store access
    /// can block a request indefinitely.
    pub async fn bounded<T>(
        &self,
        operation: impl Future<Output = StorageResult<T>>,
    ) -> Result<T, ServiceError> {
        match timeout(self.config.storage_timeout(), operation).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(ServiceError::Timeout),
        }
    }
}
