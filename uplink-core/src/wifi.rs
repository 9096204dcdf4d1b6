use std::fmt::Debug;

use crate::config::UplinkConfig;

/// Station-mode radio as seen by the connect loop.
pub trait StationLink {
    type Error: Debug;

    /// Put the radio in station mode and start associating. Must not block
    /// until the association completes.
    fn begin(&mut self, ssid: &str, passphrase: &str) -> Result<(), Self::Error>;

    fn is_connected(&mut self) -> bool;
}

pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}

/// Start association and poll the link until it reports connected.
///
/// Polls at most `max_connect_attempts` times, pausing
/// `connect_poll_interval_ms` between polls. Returns `false` when the budget
/// runs out or the radio refuses to start; the caller decides what to do next.
pub fn connect_station<L, D>(link: &mut L, delay: &mut D, config: &UplinkConfig) -> bool
where
    L: StationLink,
    D: Delay,
{
    log::info!("Connecting to '{}'...", config.ssid);

    if let Err(e) = link.begin(&config.ssid, &config.passphrase) {
        log::error!("Failed to start WiFi association: {:?}", e);
        return false;
    }

    let max_attempts = config.max_connect_attempts;
    for attempt in 1..=max_attempts {
        if link.is_connected() {
            log::info!("WiFi associated after {} poll(s)", attempt);
            return true;
        }

        log::debug!("WiFi not connected yet ({}/{})", attempt, max_attempts);
        if attempt < max_attempts {
            delay.delay_ms(config.connect_poll_interval_ms);
        }
    }

    log::error!("WiFi did not connect after {} attempts", max_attempts);
    false
}
