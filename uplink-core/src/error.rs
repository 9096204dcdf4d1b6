use thiserror::Error;

/// Conditions the device cannot recover from on its own.
///
/// The firmware reacts to any of these by entering SOS mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("upload tick timer interrupt is still armed")]
    TimerInterruptArmed,

    #[error("could not reach backend: {0}")]
    Connect(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("WiFi SSID cannot be empty")]
    EmptySsid,

    #[error("endpoint must use https: {0}")]
    InsecureEndpoint(String),

    #[error("HTTP timeout must be non-zero")]
    ZeroTimeout,

    #[error("connect attempt budget must be non-zero")]
    ZeroConnectAttempts,
}
