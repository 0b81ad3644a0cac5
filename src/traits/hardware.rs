//! Hardware abstraction traits for the roaster's sensors and actuators.
//!
//! This module defines the capability interfaces the control loop is written
//! against, so the same loop runs on the ESP32, on the host simulator, and
//! in tests with mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RtdSensor`] | RTD amplifier (MAX31865) ratio code and fault status |
//! | [`PositionInput`] | Rotary encoder count or potentiometer ADC value |
//! | [`HeaterOutput`] | Heater drive (SSR or PWM) |
//! | [`DrumMotor`] | Drum motor PWM |
//! | [`Clock`] | Monotonic millisecond time source |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use rs_roaster::traits::{DrumMotor, HeaterOutput};
//! use rs_roaster::hal::{MockHeater, MockMotor};
//!
//! let mut heater = MockHeater::new();
//! heater.set_duty(60).unwrap();
//! heater.off().unwrap();
//! assert_eq!(heater.duty, 0);
//!
//! let mut motor = MockMotor::new();
//! motor.set_speed(75).unwrap();
//! assert_eq!(motor.speed, 75);
//! ```

use core::fmt;

/// Fault status bits latched by the RTD amplifier.
///
/// Bit layout follows the MAX31865 fault status register. The two low
/// bits are unused and always masked off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtdFault(u8);

impl RtdFault {
    /// RTD resistance above the high threshold (open probe).
    pub const RTD_HIGH_THRESHOLD: u8 = 0x80;
    /// RTD resistance below the low threshold (shorted probe).
    pub const RTD_LOW_THRESHOLD: u8 = 0x40;
    /// REFIN- above 0.85 x V_BIAS.
    pub const REFIN_HIGH: u8 = 0x20;
    /// REFIN- below 0.85 x V_BIAS, FORCE- open.
    pub const REFIN_LOW: u8 = 0x10;
    /// RTDIN- below 0.85 x V_BIAS, FORCE- open.
    pub const RTDIN_LOW: u8 = 0x08;
    /// Over- or under-voltage on an input.
    pub const VOLTAGE: u8 = 0x04;

    const MASK: u8 = 0xFC;

    /// No fault.
    pub const NONE: Self = Self(0);

    /// Builds a fault from a raw status register value.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    /// Raw status bits.
    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Returns true if no fault bit is set.
    #[inline]
    pub const fn is_clear(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the given bit is set.
    #[inline]
    pub const fn contains(&self, bit: u8) -> bool {
        self.0 & bit != 0
    }
}

impl fmt::Display for RtdFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, &str); 6] = [
            (RtdFault::RTD_HIGH_THRESHOLD, "rtd high threshold"),
            (RtdFault::RTD_LOW_THRESHOLD, "rtd low threshold"),
            (RtdFault::REFIN_HIGH, "refin- > 0.85 bias"),
            (RtdFault::REFIN_LOW, "refin- < 0.85 bias"),
            (RtdFault::RTDIN_LOW, "rtdin- < 0.85 bias"),
            (RtdFault::VOLTAGE, "over/under voltage"),
        ];

        if self.is_clear() {
            return f.write_str("none");
        }
        let mut first = true;
        for (bit, name) in NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// RTD amplifier trait - abstracts the resistance-to-digital converter.
///
/// The converter reports the probe resistance as a 15-bit ratio of the
/// reference resistor (`code / 32768 * R_ref`). Conversion to temperature
/// happens in [`SensorAdapter`](crate::sensor::SensorAdapter).
///
/// # Implementation Notes
///
/// - `read_rtd()` performs one complete conversion and must be bounded in time
/// - Fault bits stay latched until `clear_fault()` is called
/// - Bus errors go through `Self::Error`; probe faults through `read_fault()`
pub trait RtdSensor {
    /// Error type for bus operations.
    type Error;

    /// Runs a conversion and returns the 15-bit ratio code.
    fn read_rtd(&mut self) -> Result<u16, Self::Error>;

    /// Reads the latched fault status.
    fn read_fault(&mut self) -> Result<RtdFault, Self::Error>;

    /// Clears the latched fault status.
    fn clear_fault(&mut self) -> Result<(), Self::Error>;
}

/// Raw position input trait.
///
/// Abstracts anything that yields an integer position: the accumulated
/// count of a rotary encoder, or the ADC value of a potentiometer. Mapping
/// onto a setpoint or a speed is done by the caller.
///
/// Reading a position cannot fail; out-of-range values are clamped by the
/// caller.
pub trait PositionInput {
    /// Returns the current raw position.
    fn read_position(&mut self) -> i32;
}

/// A position input that always reads the same value.
///
/// Used for the drum speed on builds without a speed potentiometer.
///
/// ```rust
/// use rs_roaster::traits::{FixedPosition, PositionInput};
///
/// let mut fixed = FixedPosition(700);
/// assert_eq!(fixed.read_position(), 700);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedPosition(pub i32);

impl PositionInput for FixedPosition {
    #[inline]
    fn read_position(&mut self) -> i32 {
        self.0
    }
}

/// Heater output trait.
///
/// # Implementation Notes
///
/// - `duty_percent` is 0 to 100; values above 100 should be treated as 100
/// - An on/off relay treats any non-zero duty as "on"; drive it with
///   [`HeaterMode::TimeProportional`](crate::config::HeaterMode) so the
///   driver switches it between 0 and 100
pub trait HeaterOutput {
    /// Error type for heater writes.
    type Error;

    /// Sets the heater duty in percent.
    fn set_duty(&mut self, duty_percent: u8) -> Result<(), Self::Error>;

    /// Convenience method to de-energize the heater.
    fn off(&mut self) -> Result<(), Self::Error> {
        self.set_duty(0)
    }
}

/// Drum motor trait - abstracts PWM control of the drum motor.
pub trait DrumMotor {
    /// Error type for motor writes.
    type Error;

    /// Sets the motor speed in percent (0 to 100).
    ///
    /// Values above 100 should be treated as 100.
    fn set_speed(&mut self, speed_percent: u8) -> Result<(), Self::Error>;

    /// Convenience method to stop the motor.
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.set_speed(0)
    }
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time in milliseconds for tick timing. On desktop,
/// this can wrap `std::time::Instant`. On embedded, use a hardware timer.
///
/// # Example
///
/// ```rust
/// use rs_roaster::traits::Clock;
/// use rs_roaster::hal::MockClock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 500);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // RtdFault Tests
    // =========================================================================

    #[test]
    fn rtd_fault_masks_unused_bits() {
        let fault = RtdFault::from_bits(0x03);
        assert!(fault.is_clear());
        assert_eq!(fault, RtdFault::NONE);
    }

    #[test]
    fn rtd_fault_contains() {
        let fault = RtdFault::from_bits(RtdFault::RTD_HIGH_THRESHOLD | RtdFault::REFIN_LOW);
        assert!(fault.contains(RtdFault::RTD_HIGH_THRESHOLD));
        assert!(fault.contains(RtdFault::REFIN_LOW));
        assert!(!fault.contains(RtdFault::VOLTAGE));
        assert!(!fault.is_clear());
        assert_eq!(fault.bits(), 0x90);
    }

    #[test]
    fn rtd_fault_display() {
        assert_eq!(RtdFault::NONE.to_string(), "none");
        assert_eq!(
            RtdFault::from_bits(RtdFault::RTD_HIGH_THRESHOLD).to_string(),
            "rtd high threshold"
        );
        assert_eq!(
            RtdFault::from_bits(RtdFault::RTD_LOW_THRESHOLD | RtdFault::VOLTAGE).to_string(),
            "rtd low threshold, over/under voltage"
        );
    }

    // =========================================================================
    // Default Method Tests
    // =========================================================================

    struct TestHeater {
        duty: u8,
    }

    impl HeaterOutput for TestHeater {
        type Error = ();

        fn set_duty(&mut self, duty_percent: u8) -> Result<(), ()> {
            self.duty = duty_percent;
            Ok(())
        }
    }

    #[test]
    fn heater_off_default_impl() {
        let mut heater = TestHeater { duty: 80 };
        heater.off().unwrap();
        assert_eq!(heater.duty, 0);
    }

    struct TestMotor {
        speed: u8,
        calls: usize,
    }

    impl DrumMotor for TestMotor {
        type Error = ();

        fn set_speed(&mut self, speed_percent: u8) -> Result<(), ()> {
            self.speed = speed_percent;
            self.calls += 1;
            Ok(())
        }
    }

    #[test]
    fn motor_stop_default_impl() {
        let mut motor = TestMotor { speed: 0, calls: 0 };
        motor.set_speed(60).unwrap();
        motor.stop().unwrap();
        assert_eq!(motor.speed, 0);
        assert_eq!(motor.calls, 2);
    }

    #[test]
    fn fixed_position_is_constant() {
        let mut fixed = FixedPosition(-3);
        assert_eq!(fixed.read_position(), -3);
        assert_eq!(fixed.read_position(), -3);
    }
}
