use serde::{Deserialize, Serialize};

/// Heartbeat the firmware posts on every upload tick.
///
/// `sensorid` is the key the backend files recordings under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceStatus {
    pub sensorid: u32,
    pub firmware: String,
    pub uptime_secs: u64,
    pub free_heap_bytes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi_dbm: Option<i8>,
    pub sequence: u32,
}

impl DeviceStatus {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn status() -> DeviceStatus {
        DeviceStatus {
            sensorid: 3,
            firmware: "0.1.0".to_string(),
            uptime_secs: 125,
            free_heap_bytes: 180_000,
            rssi_dbm: Some(-61),
            sequence: 9,
        }
    }

    #[test]
    fn test_field_names_match_backend() {
        let json: Value = serde_json::from_str(&status().to_json().unwrap()).unwrap();
        assert_eq!(json["sensorid"], 3);
        assert_eq!(json["uptime_secs"], 125);
        assert_eq!(json["rssi_dbm"], -61);
        assert_eq!(json["sequence"], 9);
    }

    #[test]
    fn test_missing_rssi_is_omitted() {
        let mut status = status();
        status.rssi_dbm = None;
        let json = status.to_json().unwrap();
        assert!(!json.contains("rssi_dbm"));
    }
}
