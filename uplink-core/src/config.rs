/// Configuration structures that can be tested independently
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT_URL: &str =
    "https://capstone-backend-f6qu.onrender.com/api/send_recording";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UplinkConfig {
    // WiFi settings
    pub ssid: String,
    pub passphrase: String,
    pub max_connect_attempts: u32,
    pub connect_poll_interval_ms: u32,

    // Backend settings
    pub endpoint_url: String,
    pub timeout_ms: u32,
    pub verify_server_cert: bool,

    // Upload loop
    pub sensor_id: u32,
    pub upload_interval_secs: u32,
    pub upload_max_attempts: u32,

    // Logging
    pub log_level: String,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            passphrase: String::new(),
            max_connect_attempts: 10,
            connect_poll_interval_ms: 1000,
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            timeout_ms: 50_000,
            verify_server_cert: true,
            sensor_id: 1,
            upload_interval_secs: 60,
            upload_max_attempts: 3,
            log_level: "info".to_string(),
        }
    }
}

impl UplinkConfig {
    pub fn with_credentials(ssid: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    pub fn has_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// Reject settings the firmware cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::EmptySsid);
        }
        if !self.endpoint_url.starts_with("https://") {
            return Err(ConfigError::InsecureEndpoint(self.endpoint_url.clone()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_connect_attempts == 0 {
            return Err(ConfigError::ZeroConnectAttempts);
        }
        Ok(())
    }

    /// `None` when `log_level` is not one of off/error/warn/info/debug/trace.
    pub fn log_level_filter(&self) -> Option<LevelFilter> {
        self.log_level.trim().parse().ok()
    }
}
