pub mod https_client;
pub mod wifi;

pub use https_client::EspTransport;
pub use wifi::WifiManager;
