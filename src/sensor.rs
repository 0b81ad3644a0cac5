//! Sensor adapter: RTD temperature, setpoint encoder and drum speed input.
//!
//! [`SensorAdapter`] wraps the hardware drivers and turns their raw output
//! into plain numbers the control loop can use:
//!
//! - [`read_temperature_f`](SensorAdapter::read_temperature_f) - RTD ratio
//!   code → resistance → °C (Callendar-Van Dusen) → °F
//! - [`read_encoder_position`](SensorAdapter::read_encoder_position) - raw
//!   count → [`EncoderPosition`] in `[0, 450]`
//! - [`read_motor_speed`](SensorAdapter::read_motor_speed) - raw speed
//!   input → percent
//!
//! # Example
//!
//! ```rust
//! use rs_roaster::config::SensorConfig;
//! use rs_roaster::hal::{MockPosition, MockRtd};
//! use rs_roaster::sensor::{SensorAdapter, TemperatureReading};
//! use rs_roaster::traits::FixedPosition;
//!
//! let mut rtd = MockRtd::new();
//! rtd.set_fahrenheit(212.0);
//!
//! let mut sensors = SensorAdapter::new(
//!     rtd,
//!     MockPosition::at(400),
//!     FixedPosition(1023),
//!     SensorConfig::default(),
//! );
//!
//! let temp = sensors.read_temperature_f().value().unwrap();
//! assert!((temp - 212.0).abs() < 0.5);
//! assert_eq!(sensors.read_encoder_position().get(), 400);
//! assert_eq!(sensors.read_motor_speed(), 100);
//! ```

use core::fmt::Debug;

use num_traits::Float;

use crate::clamp::clamp;
use crate::config::SensorConfig;
use crate::error::SensorFault;
use crate::traits::{PositionInput, RtdSensor};

/// Callendar-Van Dusen coefficient A (IEC 60751).
pub const RTD_A: f32 = 3.9083e-3;
/// Callendar-Van Dusen coefficient B (IEC 60751).
pub const RTD_B: f32 = -5.775e-7;
/// Callendar-Van Dusen coefficient C, below 0 °C only (IEC 60751).
pub const RTD_C: f32 = -4.183e-12;

/// Full-scale value of the converter's 15-bit ratio code.
pub const RTD_FULL_SCALE: f32 = 32768.0;

/// One temperature sample.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TemperatureReading {
    /// Temperature in °F.
    Valid(f32),
    /// No usable reading this tick.
    Invalid(SensorFault),
}

impl TemperatureReading {
    /// Returns the temperature if valid.
    #[inline]
    pub fn value(&self) -> Option<f32> {
        match *self {
            TemperatureReading::Valid(t) => Some(t),
            TemperatureReading::Invalid(_) => None,
        }
    }

    /// Returns the fault if invalid.
    #[inline]
    pub fn fault(&self) -> Option<SensorFault> {
        match *self {
            TemperatureReading::Valid(_) => None,
            TemperatureReading::Invalid(fault) => Some(fault),
        }
    }

    /// Returns true for a valid reading.
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, TemperatureReading::Valid(_))
    }

    /// Rejects NaN and readings outside `[min_f, max_f]`.
    ///
    /// Out-of-range values are turned into [`SensorFault::OutOfRange`],
    /// never clamped.
    pub fn validated(self, min_f: f32, max_f: f32) -> Self {
        match self {
            TemperatureReading::Valid(t) if t.is_nan() => {
                TemperatureReading::Invalid(SensorFault::NotANumber)
            }
            TemperatureReading::Valid(t) if t < min_f || max_f < t => {
                TemperatureReading::Invalid(SensorFault::OutOfRange)
            }
            other => other,
        }
    }
}

/// Encoder position in `[0, 450]`, one step per °F by default.
///
/// Always clamped at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderPosition(u16);

impl EncoderPosition {
    /// Lowest position.
    pub const MIN: u16 = 0;
    /// Highest position.
    pub const MAX: u16 = 450;

    /// Builds a position, clamping `raw` into `[MIN, MAX]`.
    #[inline]
    pub fn new(raw: i32) -> Self {
        Self(clamp(raw, Self::MIN as i32, Self::MAX as i32) as u16)
    }

    /// The position value.
    #[inline]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Converts a 15-bit ratio code to resistance in ohms.
#[inline]
pub fn code_to_resistance(code: u16, r_ref: f32) -> f32 {
    code as f32 / RTD_FULL_SCALE * r_ref
}

/// Converts resistance in ohms to the nearest 15-bit ratio code.
pub fn resistance_to_code(resistance: f32, r_ref: f32) -> u16 {
    let code = resistance / r_ref * RTD_FULL_SCALE + 0.5;
    clamp(code, 0.0, 32767.0) as u16
}

/// Converts probe resistance to °C.
///
/// Uses the quadratic inverse of the Callendar-Van Dusen equation at or
/// above 0 °C and a fifth-order polynomial fit below it.
pub fn resistance_to_celsius(resistance: f32, r_nominal: f32) -> f32 {
    let z1 = -RTD_A;
    let z2 = RTD_A * RTD_A - 4.0 * RTD_B;
    let z3 = 4.0 * RTD_B / r_nominal;
    let z4 = 2.0 * RTD_B;

    let discriminant = z2 + z3 * resistance;
    let temp = (Float::sqrt(discriminant) + z1) / z4;
    if temp >= 0.0 {
        return temp;
    }

    // Normalized to a PT100 for the fit
    let rt = resistance / r_nominal * 100.0;
    let mut rpoly = rt;
    let mut temp = -242.02;
    temp += 2.2228 * rpoly;
    rpoly *= rt;
    temp += 2.5859e-3 * rpoly;
    rpoly *= rt;
    temp -= 4.8260e-6 * rpoly;
    rpoly *= rt;
    temp -= 2.8183e-8 * rpoly;
    rpoly *= rt;
    temp += 1.5243e-10 * rpoly;
    temp
}

/// Probe resistance at `celsius` (forward Callendar-Van Dusen).
pub fn celsius_to_resistance(celsius: f32, r_nominal: f32) -> f32 {
    let t = celsius;
    let mut ratio = 1.0 + RTD_A * t + RTD_B * t * t;
    if t < 0.0 {
        ratio += RTD_C * (t - 100.0) * t * t * t;
    }
    r_nominal * ratio
}

/// °C to °F.
#[inline]
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

/// °F to °C.
#[inline]
pub fn fahrenheit_to_celsius(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Wraps the RTD driver, the setpoint encoder and the drum speed input.
///
/// # Type Parameters
///
/// - `S`: RTD amplifier ([`RtdSensor`])
/// - `E`: setpoint encoder or potentiometer ([`PositionInput`])
/// - `P`: drum speed input ([`PositionInput`]); use
///   [`FixedPosition`](crate::traits::FixedPosition) without a pot
pub struct SensorAdapter<S, E, P> {
    rtd: S,
    encoder: E,
    speed: P,
    config: SensorConfig,
}

impl<S, E, P> SensorAdapter<S, E, P>
where
    S: RtdSensor,
    S::Error: Debug,
    E: PositionInput,
    P: PositionInput,
{
    /// Creates an adapter around the given drivers.
    pub fn new(rtd: S, encoder: E, speed: P, config: SensorConfig) -> Self {
        Self {
            rtd,
            encoder,
            speed,
            config,
        }
    }

    /// Reads the probe temperature in °F.
    ///
    /// Driver faults and bus errors come back as
    /// [`TemperatureReading::Invalid`]. Range checking is left to the
    /// caller, see [`TemperatureReading::validated`].
    pub fn read_temperature_f(&mut self) -> TemperatureReading {
        let code = match self.rtd.read_rtd() {
            Ok(code) => code,
            Err(err) => {
                tracing::warn!(?err, "RTD read failed");
                return TemperatureReading::Invalid(SensorFault::Bus);
            }
        };

        match self.rtd.read_fault() {
            Ok(fault) if fault.is_clear() => {}
            Ok(fault) => {
                tracing::warn!(%fault, "RTD fault latched");
                if let Err(err) = self.rtd.clear_fault() {
                    tracing::warn!(?err, "RTD fault clear failed");
                }
                return TemperatureReading::Invalid(SensorFault::Rtd(fault));
            }
            Err(err) => {
                tracing::warn!(?err, "RTD fault status read failed");
                return TemperatureReading::Invalid(SensorFault::Bus);
            }
        }

        let resistance = code_to_resistance(code, self.config.r_ref);
        let celsius = resistance_to_celsius(resistance, self.config.r_nominal);
        let fahrenheit = celsius_to_fahrenheit(celsius);
        tracing::trace!(code, resistance, fahrenheit, "RTD sample");

        if fahrenheit.is_nan() {
            TemperatureReading::Invalid(SensorFault::NotANumber)
        } else {
            TemperatureReading::Valid(fahrenheit)
        }
    }

    /// Reads the setpoint encoder, mapped and clamped to `[0, 450]`.
    pub fn read_encoder_position(&mut self) -> EncoderPosition {
        let raw = self.encoder.read_position();
        let span = EncoderPosition::MAX as i32;
        EncoderPosition::new(self.config.setpoint_input.scale(raw, span))
    }

    /// Reads the desired drum speed in percent.
    pub fn read_motor_speed(&mut self) -> u8 {
        let raw = self.speed.read_position();
        self.config.speed_input.scale(raw, 100) as u8
    }

    /// The sensor configuration.
    #[inline]
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// The RTD driver.
    #[inline]
    pub fn rtd(&self) -> &S {
        &self.rtd
    }

    /// Mutable access to the RTD driver.
    #[inline]
    pub fn rtd_mut(&mut self) -> &mut S {
        &mut self.rtd
    }

    /// Mutable access to the setpoint encoder.
    #[inline]
    pub fn encoder_mut(&mut self) -> &mut E {
        &mut self.encoder
    }

    /// Mutable access to the drum speed input.
    #[inline]
    pub fn speed_input_mut(&mut self) -> &mut P {
        &mut self.speed
    }
}
