//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware traits, enabling
//! development and testing on desktop without a roaster attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRtd`] | [`RtdSensor`] | Settable temperature, injectable faults |
//! | [`MockPosition`] | [`PositionInput`] | Encoder count or ADC value |
//! | [`MockHeater`] | [`HeaterOutput`] | Tracks duty writes, injectable failures |
//! | [`MockMotor`] | [`DrumMotor`] | Tracks speed writes, injectable failures |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//!
//! # Example
//!
//! ```rust
//! use rs_roaster::hal::MockRtd;
//! use rs_roaster::traits::{RtdFault, RtdSensor};
//!
//! let mut rtd = MockRtd::new();
//! rtd.set_celsius(200.0);
//! assert!(rtd.read_rtd().unwrap() > 0);
//!
//! rtd.trigger_fault(RtdFault::RTD_HIGH_THRESHOLD);
//! assert!(!rtd.read_fault().unwrap().is_clear());
//! rtd.clear_fault().unwrap();
//! assert!(rtd.read_fault().unwrap().is_clear());
//! ```
//!
//! [`RtdSensor`]: crate::traits::RtdSensor
//! [`PositionInput`]: crate::traits::PositionInput
//! [`HeaterOutput`]: crate::traits::HeaterOutput
//! [`DrumMotor`]: crate::traits::DrumMotor
//! [`Clock`]: crate::traits::Clock

use crate::sensor::{celsius_to_resistance, fahrenheit_to_celsius, resistance_to_code};
use crate::traits::{Clock, DrumMotor, HeaterOutput, PositionInput, RtdFault, RtdSensor};

// ============================================================================
// Sensor Mocks
// ============================================================================

/// Mock RTD amplifier.
///
/// Holds a raw ratio code and a fault register. The code is computed
/// from a temperature with [`set_celsius`](Self::set_celsius) or
/// [`set_fahrenheit`](Self::set_fahrenheit), or written directly.
#[derive(Debug)]
pub struct MockRtd {
    /// Raw 15-bit ratio code returned by `read_rtd`.
    pub code: u16,
    /// Latched fault status.
    pub fault: RtdFault,
    /// When set, every driver call fails.
    pub bus_error: bool,
    /// Number of `read_rtd` calls.
    pub read_count: usize,
    /// Number of `clear_fault` calls.
    pub clear_count: usize,
    /// Reference resistor used to compute codes.
    pub r_ref: f32,
    /// Nominal probe resistance at 0 °C.
    pub r_nominal: f32,
}

impl MockRtd {
    /// Creates a PT100 on a 430 Ω reference reading room temperature (20 °C).
    pub fn new() -> Self {
        let mut rtd = Self {
            code: 0,
            fault: RtdFault::NONE,
            bus_error: false,
            read_count: 0,
            clear_count: 0,
            r_ref: 430.0,
            r_nominal: 100.0,
        };
        rtd.set_celsius(20.0);
        rtd
    }

    /// Sets the probe temperature in °C.
    pub fn set_celsius(&mut self, celsius: f32) {
        let resistance = celsius_to_resistance(celsius, self.r_nominal);
        self.code = resistance_to_code(resistance, self.r_ref);
    }

    /// Sets the probe temperature in °F.
    pub fn set_fahrenheit(&mut self, fahrenheit: f32) {
        self.set_celsius(fahrenheit_to_celsius(fahrenheit));
    }

    /// Latches the given fault bits.
    pub fn trigger_fault(&mut self, bits: u8) {
        self.fault = RtdFault::from_bits(self.fault.bits() | bits);
    }

    /// Clears the fault and bus error conditions.
    pub fn clear(&mut self) {
        self.fault = RtdFault::NONE;
        self.bus_error = false;
    }
}

impl Default for MockRtd {
    fn default() -> Self {
        Self::new()
    }
}

impl RtdSensor for MockRtd {
    type Error = ();

    fn read_rtd(&mut self) -> Result<u16, ()> {
        self.read_count += 1;
        if self.bus_error {
            return Err(());
        }
        Ok(self.code)
    }

    fn read_fault(&mut self) -> Result<RtdFault, ()> {
        if self.bus_error {
            return Err(());
        }
        Ok(self.fault)
    }

    fn clear_fault(&mut self) -> Result<(), ()> {
        self.clear_count += 1;
        if self.bus_error {
            return Err(());
        }
        self.fault = RtdFault::NONE;
        Ok(())
    }
}

/// Mock position input: an encoder count or a potentiometer ADC value.
///
/// # Example
///
/// ```rust
/// use rs_roaster::hal::MockPosition;
/// use rs_roaster::traits::PositionInput;
///
/// let mut knob = MockPosition::at(225);
/// assert_eq!(knob.read_position(), 225);
///
/// knob.position = 400;
/// assert_eq!(knob.read_position(), 400);
/// assert_eq!(knob.read_count, 2);
/// ```
#[derive(Debug, Default)]
pub struct MockPosition {
    /// Value returned by `read_position`.
    pub position: i32,
    /// Number of reads.
    pub read_count: usize,
}

impl MockPosition {
    /// Creates an input at position 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input at the given position.
    pub fn at(position: i32) -> Self {
        Self {
            position,
            read_count: 0,
        }
    }
}

impl PositionInput for MockPosition {
    fn read_position(&mut self) -> i32 {
        self.read_count += 1;
        self.position
    }
}

// ============================================================================
// Actuator Mocks
// ============================================================================

/// Mock heater output.
///
/// Records the last duty written. Set `fail` to reject every write, or
/// `fail_next` to reject only the next one.
///
/// # Example
///
/// ```rust
/// use rs_roaster::hal::MockHeater;
/// use rs_roaster::traits::HeaterOutput;
///
/// let mut heater = MockHeater::new();
/// heater.set_duty(40).unwrap();
/// assert_eq!(heater.duty, 40);
///
/// heater.fail_next = true;
/// assert!(heater.set_duty(50).is_err());
/// assert_eq!(heater.duty, 40);
/// heater.set_duty(50).unwrap();
/// assert_eq!(heater.call_count, 3);
/// ```
#[derive(Debug, Default)]
pub struct MockHeater {
    /// Current duty in percent.
    pub duty: u8,
    /// Number of `set_duty` calls, failed ones included.
    pub call_count: usize,
    /// Reject every write.
    pub fail: bool,
    /// Reject the next write only.
    pub fail_next: bool,
}

impl MockHeater {
    /// Creates a heater that is off.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeaterOutput for MockHeater {
    type Error = ();

    fn set_duty(&mut self, duty_percent: u8) -> Result<(), ()> {
        self.call_count += 1;
        if self.fail || core::mem::take(&mut self.fail_next) {
            return Err(());
        }
        self.duty = duty_percent;
        Ok(())
    }
}

/// Mock drum motor.
///
/// Records the last speed written. Set `fail` to reject writes.
#[derive(Debug, Default)]
pub struct MockMotor {
    /// Current speed in percent.
    pub speed: u8,
    /// Number of `set_speed` calls, failed ones included.
    pub call_count: usize,
    /// Reject every write.
    pub fail: bool,
}

impl MockMotor {
    /// Creates a stopped motor.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrumMotor for MockMotor {
    type Error = ();

    fn set_speed(&mut self, speed_percent: u8) -> Result<(), ()> {
        self.call_count += 1;
        if self.fail {
            return Err(());
        }
        self.speed = speed_percent;
        Ok(())
    }
}

// ============================================================================
// Time
// ============================================================================

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_roaster::hal::MockClock;
/// use rs_roaster::traits::Clock;
///
/// let mut clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances the clock by the given duration.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

// ============================================================================
// Tests
// ============================================================================
