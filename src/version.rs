// Centralized version information

// Cargo package version from Cargo.toml
pub const CARGO_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const FIRMWARE_NAME: &str = env!("CARGO_PKG_NAME");

// Version string for logging and the heartbeat payload
pub fn full_version() -> String {
    format!("{} v{}", FIRMWARE_NAME, CARGO_VERSION)
}
