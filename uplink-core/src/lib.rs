//! Uplink Core - Hardware-independent logic for the recording uplink firmware
//!
//! Everything here runs on the host: the WiFi polling loop, the HTTP
//! send/retry policy and the SOS blink pattern are written against small
//! traits that the firmware implements with ESP-IDF drivers.

pub mod config;
pub mod error;
pub mod payload;
pub mod sender;
pub mod sos;
pub mod status;
pub mod wifi;

pub use config::UplinkConfig;
pub use error::{ConfigError, FatalError};
pub use sender::{
    is_bad_outcome, DeliveryReport, Exchange, HttpResponse, InterruptFlag, TelemetrySender,
    Transport,
};
pub use status::is_bad_http_code;
pub use wifi::{connect_station, Delay, StationLink};
