use std::fs;
use std::path::Path;

/// `#define`s read from wifi_config.h, exported as env vars of the same name.
const DEFINES: [&str; 3] = ["WIFI_SSID", "WIFI_PASSWORD", "BACKEND_URL"];

fn main() -> anyhow::Result<()> {
    // Necessary for ESP-IDF
    embuild::espidf::sysenv::output();

    let wifi_config_path = "wifi_config.h";
    println!("cargo:rerun-if-changed={}", wifi_config_path);

    let contents = if Path::new(wifi_config_path).exists() {
        fs::read_to_string(wifi_config_path)?
    } else {
        println!("cargo:warning=wifi_config.h not found! Copy wifi_config.h.example to wifi_config.h and add your credentials.");
        String::new()
    };

    for define in DEFINES {
        let value = contents
            .lines()
            .find(|l| l.contains(&format!("#define {} ", define)))
            .and_then(|l| l.split('"').nth(1))
            .unwrap_or("");
        println!("cargo:rustc-env={}={}", define, value);
    }

    Ok(())
}
