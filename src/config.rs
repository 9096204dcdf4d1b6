use anyhow::Result;
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use uplink_core::UplinkConfig;

const CONFIG_NAMESPACE: &str = "uplink";
const CONFIG_KEY: &str = "config";
const MAX_CONFIG_SIZE: usize = 1024;

/// Defaults with the credentials and endpoint compiled in by build.rs.
///
/// These come from wifi_config.h which should NOT be committed to git.
pub fn compiled_defaults() -> UplinkConfig {
    let mut config = UplinkConfig::with_credentials(env!("WIFI_SSID"), env!("WIFI_PASSWORD"));

    let backend_url = env!("BACKEND_URL");
    if !backend_url.is_empty() {
        config.endpoint_url = backend_url.to_string();
    }

    config
}

pub fn load_or_default(partition: EspDefaultNvsPartition) -> Result<UplinkConfig> {
    let mut nvs = EspNvs::new(partition, CONFIG_NAMESPACE, true)?;

    let config = match load_from_nvs(&nvs) {
        Ok(Some(mut config)) => {
            log::info!("Loaded configuration from NVS");

            // If NVS has empty WiFi credentials, use the compiled-in ones
            if !config.has_credentials() {
                let defaults = compiled_defaults();
                log::warn!(
                    "NVS WiFi credentials empty, using compiled defaults: SSID='{}'",
                    defaults.ssid
                );
                config.ssid = defaults.ssid;
                config.passphrase = defaults.passphrase;

                if let Err(e) = save_to_nvs(&mut nvs, &config) {
                    log::warn!("Failed to save updated config with WiFi credentials: {:?}", e);
                }
            }
            config
        }
        Ok(None) => {
            log::info!("No stored configuration, using compiled defaults");
            let config = compiled_defaults();

            // Save for next boot
            if let Err(e) = save_to_nvs(&mut nvs, &config) {
                log::warn!("Failed to save default config to NVS: {:?}", e);
            }
            config
        }
        Err(e) => {
            log::warn!("Failed to load config from NVS: {:?}, using defaults", e);
            compiled_defaults()
        }
    };

    log::info!(
        "WiFi credentials: SSID='{}', Password={}",
        config.ssid,
        if config.passphrase.is_empty() { "<empty>" } else { "<set>" }
    );

    config.validate()?;
    Ok(config)
}

fn load_from_nvs(nvs: &EspNvs<NvsDefault>) -> Result<Option<UplinkConfig>> {
    let mut buf = [0u8; MAX_CONFIG_SIZE];
    match nvs.get_blob(CONFIG_KEY, &mut buf)? {
        Some(data) => Ok(Some(serde_json::from_slice(data)?)),
        None => Ok(None),
    }
}

fn save_to_nvs(nvs: &mut EspNvs<NvsDefault>, config: &UplinkConfig) -> Result<()> {
    let json = serde_json::to_vec(config)?;
    nvs.set_blob(CONFIG_KEY, &json)?;
    log::info!("Configuration saved to NVS");
    Ok(())
}
