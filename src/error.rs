//! Error taxonomy for the roaster controller.
//!
//! | Type | Raised by | Handling |
//! |------|-----------|----------|
//! | [`SensorFault`] | [`SensorAdapter`](crate::sensor::SensorAdapter), [`ControlLoop`](crate::ControlLoop) | Held for up to N ticks, then `Faulted` |
//! | [`ConfigError`] | [`Config::validate`](crate::Config::validate) | Fatal at startup |
//! | [`ActuatorError`] | [`ActuatorDriver`](crate::actuator::ActuatorDriver) | Logged, heater forced off for the tick |
//!
//! Saturation and setpoint changes are not errors; they are handled by
//! clamping.

use thiserror::Error;

use crate::traits::RtdFault;

/// Why a temperature reading could not be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorFault {
    /// The amplifier latched a fault (open or shorted probe, threshold, bias).
    #[error("RTD fault: {0}")]
    Rtd(RtdFault),
    /// The bus transaction with the amplifier failed.
    #[error("sensor bus error")]
    Bus,
    /// The converted reading is outside the plausible range.
    #[error("reading outside plausible range")]
    OutOfRange,
    /// The conversion produced NaN.
    #[error("reading is not a number")]
    NotANumber,
}

/// Invalid configuration. Never tolerated at runtime.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A `low`/`high` pair has `low > high`.
    #[error("inverted bounds for {what}: {low} > {high}")]
    InvertedBounds {
        /// Which setting.
        what: &'static str,
        /// Configured lower bound.
        low: f32,
        /// Configured upper bound.
        high: f32,
    },
    /// A pin number past the last GPIO.
    #[error("pin {pin} for {what} is not a valid GPIO")]
    InvalidPin {
        /// Which output or input.
        what: &'static str,
        /// The offending pin.
        pin: u8,
    },
    /// Two roles share one pin.
    #[error("pin {pin} assigned to both {first} and {second}")]
    DuplicatePin {
        /// The shared pin.
        pin: u8,
        /// First role using it.
        first: &'static str,
        /// Second role using it.
        second: &'static str,
    },
    /// A PID gain that is negative or not finite.
    #[error("invalid gain {name}: {value}")]
    InvalidGain {
        /// `kp`, `ki` or `kd`.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// Any other out-of-domain value.
    #[error("invalid value for {what}")]
    InvalidValue {
        /// Which setting.
        what: &'static str,
    },
}

/// An actuator write was rejected by the underlying driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActuatorError {
    /// Heater output write failed.
    #[error("heater write failed")]
    Heater,
    /// Drum motor write failed.
    #[error("motor write failed")]
    Motor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_fault_display() {
        assert_eq!(SensorFault::Bus.to_string(), "sensor bus error");
        assert_eq!(
            SensorFault::OutOfRange.to_string(),
            "reading outside plausible range"
        );
        let open = SensorFault::Rtd(RtdFault::from_bits(RtdFault::RTD_LOW_THRESHOLD));
        assert!(open.to_string().starts_with("RTD fault:"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvertedBounds {
            what: "pid output",
            low: 100.0,
            high: 0.0,
        };
        assert_eq!(err.to_string(), "inverted bounds for pid output: 100 > 0");

        let err = ConfigError::DuplicatePin {
            pin: 5,
            first: "heater_ssr",
            second: "drum_motor",
        };
        assert_eq!(
            err.to_string(),
            "pin 5 assigned to both heater_ssr and drum_motor"
        );
    }

    #[test]
    fn actuator_error_display() {
        assert_eq!(ActuatorError::Heater.to_string(), "heater write failed");
        assert_eq!(ActuatorError::Motor.to_string(), "motor write failed");
    }
}
