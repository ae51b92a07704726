use chrono_tz::Tz;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::schedule::ScheduleError;
use crate::settings::Settings;
use crate::store::ConfigStore;

/// State shared by every request handler.
pub struct AppState {
    pub settings: Settings,
    pub store: ConfigStore,
    /// Zone for configurations that do not name one
    pub fallback_zone: Tz,
    pub started_at: Instant,
    /// Held across read-modify-write cycles on the stored configuration
    pub write_lock: Mutex<()>,
}

impl AppState {
    /// Builds the state, storing the configuration under the settings'
    /// data directory.
    pub fn new(settings: Settings) -> Result<Self, ScheduleError> {
        let store = ConfigStore::new(settings.storage.data_dir.clone());
        Self::with_store(settings, store)
    }

    pub fn with_store(settings: Settings, store: ConfigStore) -> Result<Self, ScheduleError> {
        let fallback_zone = settings.schedule.fallback_zone()?;
        Ok(Self {
            settings,
            store,
            fallback_zone,
            started_at: Instant::now(),
            write_lock: Mutex::new(()),
        })
    }
}
