use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use uplink_core::sos::sos_pattern;
use uplink_core::FatalError;

const SOS_UNIT_MS: u32 = 200;

pub type StatusLed = PinDriver<'static, AnyOutputPin, Output>;

/// Blink SOS on the status LED forever. Only a reset gets the device out.
pub fn sos_mode(led: &mut StatusLed, error: &FatalError) -> ! {
    log::error!("FATAL: {} - entering SOS mode", error);

    let pattern = sos_pattern(SOS_UNIT_MS);
    loop {
        for blink in &pattern {
            let result = if blink.on { led.set_high() } else { led.set_low() };
            if let Err(e) = result {
                log::warn!("Status LED write failed: {:?}", e);
            }
            FreeRtos::delay_ms(blink.duration_ms);
        }
    }
}
