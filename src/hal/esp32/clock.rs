//! Monotonic clock from the ESP-IDF high resolution timer.

use crate::traits::Clock;

/// Milliseconds since boot.
///
/// Drives the control loop's tick deadlines and the heater's
/// time-proportioning window.
///
/// ```ignore
/// use rs_roaster::hal::esp32::Esp32Clock;
/// use rs_roaster::traits::Clock;
///
/// let clock = Esp32Clock::new();
/// let next_tick = clock.now_ms() + 500;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Esp32Clock;

impl Esp32Clock {
    /// Creates a clock handle.
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for Esp32Clock {
    #[inline]
    fn now_ms(&self) -> u64 {
        // Safe: plain read of the system timer, microseconds since boot
        let micros = unsafe { esp_idf_hal::sys::esp_timer_get_time() };
        (micros / 1000) as u64
    }
}
