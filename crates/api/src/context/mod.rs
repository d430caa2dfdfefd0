//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use pbxpresence_common::{Clock, RequestSpacer, SystemClock};
use pbxpresence_core::{
    CalendarSyncService, DiscoveryOutcome, PbxCredentials, PresenceService, Reconciler,
    ReconcilerDeps, SettingsRepository, SyncOptions, SyncReport,
};
use pbxpresence_domain::{AppConfig, PresenceError, PresenceStatus, Result};
use pbxpresence_infra::database::SettingsDefaults;
use pbxpresence_infra::{
    AesSecretCipher, DbManager, IcsCalendarFeed, InstanceLock, PbxClient, PbxClientConfig,
    SqlitePresenceStore, SyncScheduler, SyncSchedulerConfig,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: AppConfig,
    pub timezone: Tz,
    pub clock: Arc<dyn Clock>,
    pub db: Arc<DbManager>,
    pub store: Arc<SqlitePresenceStore>,
    pub pbx: Arc<PbxClient>,
    pub reconciler: Arc<Reconciler>,
    pub presence: Arc<PresenceService>,
    pub calendar: Arc<CalendarSyncService>,
    pub scheduler: Mutex<SyncScheduler>,

    // Keep instance lock alive for the lifetime of the context
    _instance_lock: InstanceLock,
}

impl AppContext {
    /// Load configuration from the environment and build the context.
    pub fn new() -> Result<Self> {
        Self::new_with_config(pbxpresence_infra::load_config()?)
    }

    /// Build the context from an explicit configuration.
    pub fn new_with_config(config: AppConfig) -> Result<Self> {
        Self::new_with_clock(config, Arc::new(SystemClock))
    }

    /// Build the context with a custom clock, for tests that pin "now".
    pub fn new_with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let timezone = config.schedule.tz()?;

        let instance_lock = InstanceLock::acquire_for_database(&config.database.path)?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let store = Arc::new(SqlitePresenceStore::new(db.clone()).with_settings_defaults(
            SettingsDefaults {
                default_status: PresenceStatus::from(config.schedule.default_status.as_str()),
                sync_interval_minutes: config.sync.interval_minutes,
            },
        ));
        let cipher = Arc::new(AesSecretCipher::from_key_file(&config.security.secret_key_path)?);

        let spacer = Arc::new(RequestSpacer::new(Duration::from_millis(
            config.pbx.request_spacing_ms,
        )));
        let pbx = Arc::new(
            PbxClient::new(
                PbxClientConfig::from(&config.pbx),
                store.clone(),
                cipher.clone(),
                spacer,
            )?
            .with_clock(clock.clone()),
        );

        let reconciler = Arc::new(Reconciler::new(
            ReconcilerDeps {
                extensions: store.clone(),
                schedules: store.clone(),
                overrides: store.clone(),
                settings: store.clone(),
                batch_writer: store.clone(),
                gateway: pbx.clone(),
            },
            timezone,
            SyncOptions::from(&config.sync),
        ));

        let presence = Arc::new(PresenceService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            pbx.clone(),
            cipher,
            timezone,
            reconciler.pass_lock(),
        ));

        let calendar = Arc::new(CalendarSyncService::new(
            Arc::new(IcsCalendarFeed::new(timezone)?),
            store.clone(),
            store.clone(),
            timezone,
        ));

        seed_credentials(&config, &store, &presence, clock.now())?;

        let settings = store.load_settings()?;
        let scheduler_config = SyncSchedulerConfig {
            interval: Duration::from_secs(settings.sync_interval_minutes.max(1) * 60),
            ..SyncSchedulerConfig::from(&config.sync)
        };
        let scheduler = SyncScheduler::new(reconciler.clone(), clock.clone(), scheduler_config)
            .with_calendar_sync(calendar.clone());

        info!(
            db_path = %config.database.path,
            timezone = %timezone,
            interval_minutes = settings.sync_interval_minutes,
            configured = settings.has_credentials(),
            "Application context initialised"
        );

        Ok(Self {
            config,
            timezone,
            clock,
            db,
            store,
            pbx,
            reconciler,
            presence,
            calendar,
            scheduler: Mutex::new(scheduler),
            _instance_lock: instance_lock,
        })
    }

    /// Initial discovery, then the periodic scheduler when sync is enabled.
    ///
    /// A failed discovery is logged and does not prevent the scheduler from
    /// starting; the next pass will retry against the PBX.
    pub async fn start(&self) -> Result<()> {
        match self.discover().await {
            Ok(outcome) => {
                info!(created = outcome.created, updated = outcome.updated, "Startup discovery done");
            }
            Err(PresenceError::ConfigurationMissing(missing)) => {
                warn!(missing = %missing, "PBX not configured; waiting for credentials");
            }
            Err(err) => warn!(error = %err, "Startup discovery failed"),
        }

        if !self.config.sync.enabled {
            info!("Periodic sync disabled by configuration");
            return Ok(());
        }

        self.scheduler.lock().await.start().await?;
        Ok(())
    }

    /// Stop the scheduler if it is running.
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_running() {
            scheduler.stop().await?;
        }
        info!("Application context shut down");
        Ok(())
    }

    /// Run one reconciliation pass immediately.
    pub async fn sync_now(&self) -> Result<SyncReport> {
        self.reconciler.sync_all(self.clock.now()).await
    }

    /// Refresh local extensions from the PBX.
    pub async fn discover(&self) -> Result<DiscoveryOutcome> {
        self.reconciler.refresh_from_remote(self.clock.now()).await
    }
}

/// Copy PBX credentials from the configuration into the settings row, unless
/// the row already has credentials (set by an administrator, which wins).
fn seed_credentials(
    config: &AppConfig,
    store: &SqlitePresenceStore,
    presence: &PresenceService,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    let (Some(url), Some(client_id), Some(client_secret)) =
        (&config.pbx.url, &config.pbx.client_id, &config.pbx.client_secret)
    else {
        return Ok(());
    };
    if [url, client_id, client_secret].iter().any(|value| value.trim().is_empty()) {
        return Ok(());
    }

    if store.load_settings()?.has_credentials() {
        return Ok(());
    }

    presence.configure_pbx(
        &PbxCredentials {
            url: url.clone(),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        },
        now,
    )?;
    info!("PBX credentials seeded from configuration");
    Ok(())
}
