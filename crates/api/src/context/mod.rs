//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use stellar_core::{ConnectivityCheck, SyncResult, SyncService, SyncSettings};
use stellar_domain::{Config, Result, StellarError};
use stellar_infra::{FileConnectivityStore, FileQueueStore, IntervalScheduler, ReqwestTransport};
use tokio::task::JoinHandle;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("stellar-syncd/", env!("CARGO_PKG_VERSION"));

/// Holds the sync service and the scheduler driving its monitor
pub struct SyncContext {
    pub config: Config,
    pub service: Arc<SyncService>,
    scheduler: Arc<IntervalScheduler>,
}

impl SyncContext {
    /// Create a context from the layered configuration (file, env, defaults)
    pub fn new() -> Result<Self> {
        Self::new_with_config(stellar_infra::config::load()?)
    }

    /// Create a context from an explicit configuration
    ///
    /// Tests use this to point the daemon at a mock server and temp dir.
    pub fn new_with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let transport = ReqwestTransport::builder(config.api.base_url.clone())
            .timeout(config.api.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        let data_dir = &config.storage.data_dir;
        let service = SyncService::new(
            Arc::new(transport),
            Arc::new(FileQueueStore::new(data_dir)),
            Arc::new(FileConnectivityStore::new(data_dir)),
            SyncSettings::from_config(&config),
        )?;

        info!(
            base_url = %config.api.base_url,
            data_dir = %data_dir.display(),
            "sync context created"
        );

        Ok(Self { config, service: Arc::new(service), scheduler: Arc::new(IntervalScheduler::new()) })
    }

    /// Run the first connectivity check and start periodic monitoring
    ///
    /// Resolves only after the first check, including any reconnect drain.
    pub async fn start(&self) -> SyncResult<ConnectivityCheck> {
        start_monitor(&self.service, &self.scheduler).await
    }

    /// [`start`](Self::start) on a background task, so commands can be
    /// served while the first check and its drain are still running
    pub fn spawn_start(&self) -> JoinHandle<SyncResult<ConnectivityCheck>> {
        let service = Arc::clone(&self.service);
        let scheduler = Arc::clone(&self.scheduler);
        tokio::spawn(async move { start_monitor(&service, &scheduler).await })
    }

    /// Stop the monitor loop, letting an in-flight check finish
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        info!("shutdown called on SyncContext");
        match self.scheduler.shutdown(timeout).await {
            Ok(()) => Ok(()),
            Err(stellar_infra::SchedulerError::AlreadyStopped) => {
                warn!("scheduler already stopped");
                Ok(())
            }
            Err(err) => Err(StellarError::Internal(err.to_string())),
        }
    }

    /// Number of scheduled loops still alive
    pub fn active_tasks(&self) -> usize {
        self.scheduler.active_tasks()
    }
}

async fn start_monitor(
    service: &SyncService,
    scheduler: &IntervalScheduler,
) -> SyncResult<ConnectivityCheck> {
    let first = service.start_monitor(scheduler).await?;
    info!(state = ?first.current, "connectivity monitor running");
    Ok(first)
}
