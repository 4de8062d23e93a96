//! Application context - dependency injection container

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use liftlog_common::time::{TaskScheduler, TimerHandle, TokioScheduler};
use liftlog_core::{
    ElapsedTimeReconciler, KeyValueStorage, Notifier, SaveCoordinator, SaveRetryQueue,
    UserContext, WorkoutBackend, WorkoutStore,
};
use liftlog_domain::{Config, LiftlogError, Result};
use tracing::{error, info};

use crate::database::{DbManager, SqliteRetryQueue, SqliteWorkoutBackend};
use crate::errors::InfraError;
use crate::notifications::TracingNotifier;
use crate::storage::FileKeyValueStorage;
use crate::user::StaticUserContext;

/// Application context - holds the session engine and its adapters
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub store: WorkoutStore,
    pub reconciler: ElapsedTimeReconciler,
    pub coordinator: Arc<SaveCoordinator>,
    pub users: Arc<StaticUserContext>,
    pub backend: Arc<SqliteWorkoutBackend>,
    pub retry_queue: Arc<SqliteRetryQueue>,
    scheduler: TokioScheduler,
}

impl AppContext {
    /// Build every adapter from `config`, run migrations and restore any
    /// stored session.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the storage directory or database cannot be
    /// opened, or if there is no current runtime.
    pub async fn bootstrap(config: Config) -> Result<Self> {
        let storage: Arc<dyn KeyValueStorage> =
            Arc::new(FileKeyValueStorage::new(&config.storage.dir).map_err(|err| {
                error!(dir = %config.storage.dir, error = %err, "failed to open snapshot storage");
                err
            })?);

        let db = Arc::new(open_database(Path::new(&config.database.path), config.database.pool_size)?);
        let backend = Arc::new(SqliteWorkoutBackend::new(Arc::clone(&db)));
        let retry_queue = Arc::new(SqliteRetryQueue::new(Arc::clone(&db)));
        let users = Arc::new(StaticUserContext::new(config.user.user_id.clone()));

        let scheduler = TokioScheduler::current().map_err(|err| {
            LiftlogError::Internal(format!("AppContext requires a tokio runtime: {err}"))
        })?;
        let deferred: Arc<dyn TaskScheduler> = Arc::new(scheduler.clone());
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

        let store = WorkoutStore::builder(storage, deferred)
            .with_notifier(notifier)
            .with_config(config.session.clone())
            .build();
        let recovered = store.rehydrate();

        let reconciler = ElapsedTimeReconciler::new(store.clone());
        let coordinator = Arc::new(SaveCoordinator::new(
            store.clone(),
            Arc::clone(&backend) as Arc<dyn WorkoutBackend>,
            Arc::clone(&users) as Arc<dyn UserContext>,
            Arc::clone(&retry_queue) as Arc<dyn SaveRetryQueue>,
        ));

        info!(
            db_path = %config.database.path,
            storage_dir = %config.storage.dir,
            session_recovered = recovered,
            "application context initialised"
        );

        Ok(Self {
            config,
            db,
            store,
            reconciler,
            coordinator,
            users,
            backend,
            retry_queue,
            scheduler,
        })
    }

    /// Drive the session and rest timers once per second.
    ///
    /// The returned handle stops the ticker when cancelled.
    pub fn start_ticker(&self) -> TimerHandle {
        let store = self.store.clone();
        self.scheduler.every(Duration::from_secs(1), move || {
            store.tick();
            store.tick_rest_timer();
        })
    }
}

fn open_database(path: &Path, pool_size: u32) -> Result<DbManager> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(InfraError::from)?;
    }
    let db = DbManager::new(path, pool_size)?;
    db.run_migrations().map_err(|err| {
        error!(db_path = %path.display(), error = %err, "database migrations failed");
        err
    })?;
    Ok(db)
}
