use uplink_core::payload::DeviceStatus;

/// Snapshot of device health for the next upload.
pub fn device_status(sensor_id: u32, sequence: u32, rssi_dbm: Option<i8>) -> DeviceStatus {
    let uptime_us = unsafe { esp_idf_sys::esp_timer_get_time() };
    let free_heap_bytes = unsafe { esp_idf_sys::esp_get_free_heap_size() };

    DeviceStatus {
        sensorid: sensor_id,
        firmware: crate::version::full_version(),
        uptime_secs: (uptime_us / 1_000_000) as u64,
        free_heap_bytes,
        rssi_dbm,
        sequence,
    }
}
