use anyhow::Result;
use esp_idf_hal::{
    delay::FreeRtos,
    gpio::{OutputPin, PinDriver},
    prelude::*,
};
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use esp_idf_sys as _; // Binstart
use std::time::Duration;

use log::info;
use uplink_core::TelemetrySender;

// Generate ESP-IDF app descriptor
#[allow(unexpected_cfgs)]
mod app_desc {
    esp_idf_sys::esp_app_desc!();
}

mod config;
mod hardware_timer;
mod logging;
mod network;
mod sos;
mod telemetry;
mod version;

use crate::hardware_timer::UploadTick;
use crate::network::{EspTransport, WifiManager};
use crate::sos::{sos_mode, StatusLed};

const WIFI_FAILURE_RESTART_SECS: u32 = 30;
const CONFIG_FAILURE_RESTART_SECS: u32 = 60;
const IDLE_POLL_MS: u32 = 100;

fn main() -> Result<()> {
    // Initialize ESP-IDF
    esp_idf_svc::sys::link_patches();

    logging::init_logger().map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    info!("{} starting", version::full_version());
    info!("Free heap: {} bytes", unsafe { esp_idf_sys::esp_get_free_heap_size() });

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let mut led: StatusLed = PinDriver::output(peripherals.pins.gpio2.downgrade_output())?;
    led.set_low()?;

    let config = match config::load_or_default(nvs.clone()) {
        Ok(config) => config,
        Err(e) => {
            let reason = format!("Unusable configuration: {:?}", e);
            restart_after(CONFIG_FAILURE_RESTART_SECS, &reason)
        }
    };
    logging::apply_configured_level(&config.log_level, config.log_level_filter());
    info!("Uploading to {}", config.endpoint_url);

    let mut wifi = WifiManager::new(peripherals.modem, sys_loop, nvs)?;
    if !wifi.initialize_wifi(&config) {
        restart_after(WIFI_FAILURE_RESTART_SECS, "WiFi unavailable");
    }

    let interval = Duration::from_secs(u64::from(config.upload_interval_secs.max(1)));
    let tick = UploadTick::new(interval)?;
    let transport = EspTransport::new(config.verify_server_cert);
    let mut sender = TelemetrySender::new(transport, &tick, &config);

    // First upload right after boot, then on every tick
    tick.trigger();
    tick.arm()?;

    let mut sequence: u32 = 0;
    loop {
        if !tick.take_due() {
            FreeRtos::delay_ms(IDLE_POLL_MS);
            continue;
        }

        // The tick must be quiet while the request blocks
        tick.disarm()?;

        let rssi = wifi.get_signal_strength();
        let payload = telemetry::device_status(config.sensor_id, sequence, rssi).to_json()?;

        match sender.send_with_retries(&payload, config.upload_max_attempts) {
            Ok(report) if report.delivered() => {
                info!("Upload #{} delivered after {} attempt(s)", sequence, report.attempts);
            }
            Ok(report) => {
                log::warn!("Upload #{} dropped, last status {:?}", sequence, report.last_status);
            }
            Err(e) => sos_mode(&mut led, &e),
        }

        sequence = sequence.wrapping_add(1);
        tick.arm()?;
    }
}

/// Log why, wait, then reboot. Used for boot-time failures a reset may clear.
fn restart_after(secs: u32, reason: &str) -> ! {
    log::error!("{}, restarting in {} seconds", reason, secs);
    FreeRtos::delay_ms(secs * 1000);
    unsafe { esp_idf_sys::esp_restart() }
}
