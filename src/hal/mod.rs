//! Hardware Abstraction Layer for the band-pass filter.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.

pub mod uart;

pub use uart::{LogUartConfig, SerialConfig};

/// Microseconds since boot, for log timestamps.
#[cfg(target_os = "espidf")]
pub fn timestamp_us() -> i64 {
    // SAFETY: esp_timer_get_time is always safe to call
    unsafe { esp_idf_svc::sys::esp_timer_get_time() }
}
