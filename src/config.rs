/// Portal configuration.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the portal.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// File backing the durable key-value store.
    pub storage_path: PathBuf,
    /// Simulated booking service latency (default: 1000 ms).
    pub booking_delay: Duration,
    /// Delay before the dashboard redirect after a successful booking (default: 2000 ms).
    pub redirect_delay: Duration,
    /// Spacing between generated slots in minutes (default: 30).
    pub slot_interval_minutes: u32,
    /// Client description; its count of single-space-separated pieces ends every session id.
    pub client_fingerprint: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(".hellodoc-storage.json"),
            booking_delay: Duration::from_millis(1000),
            redirect_delay: Duration::from_millis(2000),
            slot_interval_minutes: 30,
            client_fingerprint: default_fingerprint(),
        }
    }
}

impl PortalConfig {
    /// Defaults overridden by `HELLODOC_*` environment variables.
    ///
    /// Unparseable numeric values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("HELLODOC_STORAGE") {
            if !path.is_empty() {
                config.storage_path = PathBuf::from(path);
            }
        }
        if let Some(ms) = env_u64("HELLODOC_BOOKING_DELAY_MS") {
            config.booking_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("HELLODOC_REDIRECT_DELAY_MS") {
            config.redirect_delay = Duration::from_millis(ms);
        }
        if let Some(minutes) = env_u64("HELLODOC_SLOT_INTERVAL_MINUTES") {
            if minutes > 0 && minutes <= 24 * 60 {
                config.slot_interval_minutes = minutes as u32;
            }
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

fn default_fingerprint() -> String {
    format!(
        "hellodoc/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        env::consts::OS,
        env::consts::ARCH
    )
}
