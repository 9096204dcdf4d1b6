// Upload tick built on the ESP-IDF esp_timer API
//
// The tick is the only interrupt source that may fire during normal
// operation. It must be stopped around every blocking network call, so its
// armed state doubles as the interrupt flag the sender checks.

use esp_idf_sys::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uplink_core::InterruptFlag;

static UPLOAD_DUE: AtomicBool = AtomicBool::new(false);

pub struct UploadTick {
    timer: esp_timer_handle_t,
    interval: Duration,
}

impl UploadTick {
    pub fn new(interval: Duration) -> Result<Self, EspError> {
        let timer_config = esp_timer_create_args_t {
            callback: Some(Self::timer_callback),
            arg: std::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"upload_tick\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };

        let mut timer: esp_timer_handle_t = std::ptr::null_mut();
        unsafe {
            esp!(esp_timer_create(&timer_config, &mut timer))?;
        }

        Ok(Self { timer, interval })
    }

    /// Start firing every `interval`.
    pub fn arm(&self) -> Result<(), EspError> {
        if self.is_active() {
            return Ok(());
        }
        let period_us = self.interval.as_micros() as u64;
        unsafe { esp!(esp_timer_start_periodic(self.timer, period_us)) }
    }

    pub fn disarm(&self) -> Result<(), EspError> {
        if !self.is_active() {
            return Ok(());
        }
        unsafe { esp!(esp_timer_stop(self.timer)) }
    }

    pub fn is_active(&self) -> bool {
        unsafe { esp_timer_is_active(self.timer) }
    }

    /// Consume a pending tick, if one fired since the last call.
    pub fn take_due(&self) -> bool {
        UPLOAD_DUE.swap(false, Ordering::AcqRel)
    }

    /// Mark an upload as due without waiting for the timer.
    pub fn trigger(&self) {
        UPLOAD_DUE.store(true, Ordering::Release);
    }

    extern "C" fn timer_callback(_arg: *mut std::ffi::c_void) {
        UPLOAD_DUE.store(true, Ordering::Release);
    }
}

impl InterruptFlag for UploadTick {
    fn is_armed(&self) -> bool {
        self.is_active()
    }
}

impl Drop for UploadTick {
    fn drop(&mut self) {
        unsafe {
            let _ = esp_timer_stop(self.timer);
            let _ = esp_timer_delete(self.timer);
        }
    }
}
