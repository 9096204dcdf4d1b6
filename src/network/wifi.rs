use anyhow::Result;
use esp_idf_hal::{delay::FreeRtos, modem::Modem};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
use uplink_core::{connect_station, Delay, StationLink, UplinkConfig};

/// Poll pauses on the FreeRTOS tick.
pub struct FreeRtosDelay;

impl Delay for FreeRtosDelay {
    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}

pub struct WifiManager {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiManager {
    pub fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self> {
        let esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs))?;
        let wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;

        log::info!("WiFi driver initialized");
        Ok(Self { wifi })
    }

    /// Join the configured network. Returns false if the link did not come up
    /// within the poll budget or DHCP failed; never fatal.
    pub fn initialize_wifi(&mut self, config: &UplinkConfig) -> bool {
        if !connect_station(self, &mut FreeRtosDelay, config) {
            return false;
        }

        log::info!("Waiting for DHCP...");
        if let Err(e) = self.wifi.wait_netif_up() {
            log::error!("Network interface did not come up: {:?}", e);
            return false;
        }

        // Power save drops the link during long TLS exchanges
        unsafe {
            use esp_idf_sys::*;
            let result = esp_wifi_set_ps(wifi_ps_type_t_WIFI_PS_NONE);
            if result == ESP_OK {
                log::info!("WiFi power save disabled for stable connection");
            } else {
                log::warn!("Failed to set WiFi power save mode: {:?}", result);
            }
        }

        log::info!(
            "WiFi connected! IP: {}, MAC: {}",
            self.get_ip().unwrap_or_else(|| "unknown".to_string()),
            self.get_mac()
        );
        true
    }

    pub fn get_ip(&self) -> Option<String> {
        self.wifi.wifi().sta_netif().get_ip_info().ok()
            .map(|ip_info| format!("{}", ip_info.ip))
    }

    pub fn get_mac(&self) -> String {
        self.wifi.wifi().sta_netif().get_mac().ok()
            .map(|mac| format!("{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
                              mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]))
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// RSSI of the current AP, if associated.
    pub fn get_signal_strength(&self) -> Option<i8> {
        unsafe {
            let mut ap_info: esp_idf_sys::wifi_ap_record_t = std::mem::zeroed();
            (esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap_info) == esp_idf_sys::ESP_OK)
                .then_some(ap_info.rssi)
        }
    }
}

impl StationLink for WifiManager {
    type Error = anyhow::Error;

    fn begin(&mut self, ssid: &str, passphrase: &str) -> Result<()> {
        let cfg = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into()
                .map_err(|e| {
                    log::error!("Failed to convert SSID '{}': {:?}", ssid, e);
                    anyhow::anyhow!("Invalid SSID format: {}", ssid)
                })?,
            password: passphrase.try_into()
                .map_err(|e| {
                    log::error!("Failed to convert password: {:?}", e);
                    anyhow::anyhow!("Invalid password format")
                })?,
            auth_method: if passphrase.is_empty() {
                log::warn!("WiFi password is empty, using open network");
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });

        self.wifi.set_configuration(&cfg)?;

        if !self.wifi.is_started()? {
            log::info!("Starting WiFi in station mode...");
            self.wifi.start()?;
        }

        // Non-blocking: association completes in the background while we poll
        self.wifi.wifi_mut().connect()?;
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
