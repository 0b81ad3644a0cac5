//! Shared configuration for the roaster controller.
//!
//! Pins, sensor calibration, PID gains, actuator limits and loop cadence all
//! live in one [`Config`] that is built once at startup and handed to
//! [`ControlLoop::new`](crate::ControlLoop::new). Uses `heapless::String`
//! for `no_std` compatibility while remaining ergonomic on desktop.
//!
//! # Example
//!
//! ```rust
//! use rs_roaster::config::{Config, PidConfig, LoopConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = Config::default()
//!     .with_pid(PidConfig::default().with_gains(20.0, 0.5, 0.0))
//!     .with_control(LoopConfig::default().with_tick_ms(1000));
//! assert!(config.validate().is_ok());
//! ```

use heapless::String as HString;

use crate::error::ConfigError;
use crate::pid::PidGains;

/// Maximum length for short config strings (device names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    // Last char boundary that still fits
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= MAX_SHORT_STRING)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

fn check_bounds(what: &'static str, low: f32, high: f32) -> Result<(), ConfigError> {
    if !low.is_finite() || !high.is_finite() {
        return Err(ConfigError::InvalidValue { what });
    }
    if high < low {
        return Err(ConfigError::InvertedBounds { what, low, high });
    }
    Ok(())
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete controller configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Device identification
    pub device: DeviceConfig,
    /// GPIO assignments
    pub pins: PinConfig,
    /// RTD calibration and input mapping
    pub sensor: SensorConfig,
    /// Encoder position to setpoint mapping
    pub setpoint: SetpointConfig,
    /// PID gains and output range
    pub pid: PidConfig,
    /// Heater and motor limits
    pub actuator: ActuatorConfig,
    /// Tick cadence and fault handling
    pub control: LoopConfig,
}

impl Config {
    /// Set device configuration
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set pin configuration
    pub fn with_pins(mut self, pins: PinConfig) -> Self {
        self.pins = pins;
        self
    }

    /// Set sensor configuration
    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set setpoint configuration
    pub fn with_setpoint(mut self, setpoint: SetpointConfig) -> Self {
        self.setpoint = setpoint;
        self
    }

    /// Set PID configuration
    pub fn with_pid(mut self, pid: PidConfig) -> Self {
        self.pid = pid;
        self
    }

    /// Set actuator configuration
    pub fn with_actuator(mut self, actuator: ActuatorConfig) -> Self {
        self.actuator = actuator;
        self
    }

    /// Set control loop configuration
    pub fn with_control(mut self, control: LoopConfig) -> Self {
        self.control = control;
        self
    }

    /// Checks every section. Call once at startup; any error is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pins.validate()?;
        self.sensor.validate()?;
        self.setpoint.validate()?;
        self.pid.validate()?;
        self.actuator.validate()?;
        self.control.validate()?;
        self.check_heater_window()
    }

    /// A switching window must hold at least two whole ticks.
    fn check_heater_window(&self) -> Result<(), ConfigError> {
        if let HeaterMode::TimeProportional { window_ms } = self.actuator.heater_mode {
            let tick_ms = self.control.tick_ms;
            if window_ms % tick_ms != 0 || window_ms < 2 * tick_ms {
                return Err(ConfigError::InvalidValue {
                    what: "heater window vs tick",
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Device Config
// ============================================================================

/// Device identification configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfig {
    /// Human-readable device name
    pub name: ShortString,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: short_string("rs-roaster"),
        }
    }
}

impl DeviceConfig {
    /// Set the device name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Pin Config
// ============================================================================

/// GPIO assignments.
///
/// Defaults are the original ESP8266 wiring (A0 is GPIO17 there).
/// [`PinConfig::esp32c3`] gives the layout used by the ESP32-C3 firmware.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinConfig {
    /// Heater solid-state relay output
    pub heater_ssr: u8,
    /// Drum motor PWM output
    pub drum_motor: u8,
    /// Drum speed potentiometer (analog), if fitted
    pub potentiometer: Option<u8>,
    /// Rotary encoder A signal
    pub encoder_a: u8,
    /// Rotary encoder B signal
    pub encoder_b: u8,
    /// RTD amplifier SPI chip select
    pub rtd_cs: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            heater_ssr: 5,
            drum_motor: 16,
            potentiometer: Some(17),
            encoder_a: 4,
            encoder_b: 0,
            rtd_cs: 15,
        }
    }
}

impl PinConfig {
    /// Highest GPIO number accepted.
    pub const MAX_GPIO: u8 = 39;

    /// Pin layout of the ESP32-C3 SuperMini firmware.
    pub fn esp32c3() -> Self {
        Self {
            heater_ssr: 10,
            drum_motor: 3,
            potentiometer: Some(0),
            encoder_a: 1,
            encoder_b: 2,
            rtd_cs: 7,
        }
    }

    /// Set the heater relay pin
    pub fn with_heater_ssr(mut self, pin: u8) -> Self {
        self.heater_ssr = pin;
        self
    }

    /// Set the drum motor pin
    pub fn with_drum_motor(mut self, pin: u8) -> Self {
        self.drum_motor = pin;
        self
    }

    /// Set or remove the speed potentiometer pin
    pub fn with_potentiometer(mut self, pin: Option<u8>) -> Self {
        self.potentiometer = pin;
        self
    }

    /// Set the encoder pins
    pub fn with_encoder(mut self, a: u8, b: u8) -> Self {
        self.encoder_a = a;
        self.encoder_b = b;
        self
    }

    /// Set the RTD chip select pin
    pub fn with_rtd_cs(mut self, pin: u8) -> Self {
        self.rtd_cs = pin;
        self
    }

    /// All assigned pins with their role names.
    fn assignments(&self) -> heapless::Vec<(&'static str, u8), 6> {
        let mut pins = heapless::Vec::new();
        let _ = pins.push(("heater_ssr", self.heater_ssr));
        let _ = pins.push(("drum_motor", self.drum_motor));
        if let Some(pot) = self.potentiometer {
            let _ = pins.push(("potentiometer", pot));
        }
        let _ = pins.push(("encoder_a", self.encoder_a));
        let _ = pins.push(("encoder_b", self.encoder_b));
        let _ = pins.push(("rtd_cs", self.rtd_cs));
        pins
    }

    /// Every pin must exist and be used for one role only.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pins = self.assignments();
        for (i, &(what, pin)) in pins.iter().enumerate() {
            if pin > Self::MAX_GPIO {
                return Err(ConfigError::InvalidPin { what, pin });
            }
            if let Some(&(second, _)) = pins[i + 1..].iter().find(|(_, p)| *p == pin) {
                return Err(ConfigError::DuplicatePin {
                    pin,
                    first: what,
                    second,
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Sensor Config
// ============================================================================

/// RTD probe wiring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RtdWires {
    /// 2-wire probe.
    #[default]
    Two,
    /// 3-wire probe.
    Three,
    /// 4-wire probe.
    Four,
}

/// Notch filter frequency for the converter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MainsFilter {
    /// Reject 50 Hz.
    Hz50,
    /// Reject 60 Hz.
    #[default]
    Hz60,
}

/// Linear mapping of a raw input range onto `[0, span]`.
///
/// `raw_min` maps to 0 and `raw_max` to `span`. An inverted range
/// (`raw_min > raw_max`) reverses the direction of the knob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputRange {
    /// Raw value mapped to 0
    pub raw_min: i32,
    /// Raw value mapped to the full span
    pub raw_max: i32,
}

impl InputRange {
    /// Creates a mapping from `raw_min..=raw_max`.
    pub const fn new(raw_min: i32, raw_max: i32) -> Self {
        Self { raw_min, raw_max }
    }

    /// Maps `raw` onto `[0, span]`, clamping the result.
    pub fn scale(&self, raw: i32, span: i32) -> i32 {
        let den = self.raw_max as i64 - self.raw_min as i64;
        if den == 0 {
            return 0;
        }
        let num = (raw as i64 - self.raw_min as i64) * span as i64;
        crate::clamp::clamp(num / den, 0, span as i64) as i32
    }

    fn validate(&self, what: &'static str) -> Result<(), ConfigError> {
        if self.raw_min == self.raw_max {
            return Err(ConfigError::InvalidValue { what });
        }
        Ok(())
    }
}

/// RTD calibration and raw input mapping
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Reference resistor on the amplifier board (ohms)
    pub r_ref: f32,
    /// Probe resistance at 0 °C (ohms), 100 for PT100
    pub r_nominal: f32,
    /// Lowest plausible reading (°F)
    pub plausible_min_f: f32,
    /// Highest plausible reading (°F)
    pub plausible_max_f: f32,
    /// Probe wiring
    pub wires: RtdWires,
    /// Converter notch filter
    pub filter: MainsFilter,
    /// Encoder raw range mapped onto [0, 450]
    pub setpoint_input: InputRange,
    /// Speed input raw range mapped onto [0, 100]
    pub speed_input: InputRange,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            r_ref: 430.0,
            r_nominal: 100.0,
            plausible_min_f: 32.0,
            plausible_max_f: 600.0,
            wires: RtdWires::Two,
            filter: MainsFilter::Hz60,
            setpoint_input: InputRange::new(0, 450),
            speed_input: InputRange::new(0, 1023),
        }
    }
}

impl SensorConfig {
    /// Set the board resistor constants
    pub fn with_resistances(mut self, r_ref: f32, r_nominal: f32) -> Self {
        self.r_ref = r_ref;
        self.r_nominal = r_nominal;
        self
    }

    /// Set the plausible reading range
    pub fn with_plausible_range(mut self, min_f: f32, max_f: f32) -> Self {
        self.plausible_min_f = min_f;
        self.plausible_max_f = max_f;
        self
    }

    /// Set the probe wiring
    pub fn with_wires(mut self, wires: RtdWires) -> Self {
        self.wires = wires;
        self
    }

    /// Set the converter filter
    pub fn with_filter(mut self, filter: MainsFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the encoder raw range
    pub fn with_setpoint_input(mut self, range: InputRange) -> Self {
        self.setpoint_input = range;
        self
    }

    /// Set the speed input raw range
    pub fn with_speed_input(mut self, range: InputRange) -> Self {
        self.speed_input = range;
        self
    }

    /// Resistances must be positive and the plausible range ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.r_ref > 0.0 && self.r_ref.is_finite()) {
            return Err(ConfigError::InvalidValue { what: "r_ref" });
        }
        if !(self.r_nominal > 0.0 && self.r_nominal.is_finite()) {
            return Err(ConfigError::InvalidValue { what: "r_nominal" });
        }
        check_bounds(
            "plausible temperature range",
            self.plausible_min_f,
            self.plausible_max_f,
        )?;
        self.setpoint_input.validate("setpoint_input")?;
        self.speed_input.validate("speed_input")
    }
}

// ============================================================================
// Setpoint Config
// ============================================================================

/// Encoder position to setpoint mapping: `scale * position + offset`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SetpointConfig {
    /// °F per encoder step
    pub scale: f32,
    /// °F added after scaling
    pub offset: f32,
}

impl Default for SetpointConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl SetpointConfig {
    /// Set the scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the offset
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Scale and offset must be finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale.is_finite() {
            return Err(ConfigError::InvalidValue { what: "setpoint scale" });
        }
        if !self.offset.is_finite() {
            return Err(ConfigError::InvalidValue { what: "setpoint offset" });
        }
        Ok(())
    }
}

// ============================================================================
// PID Config
// ============================================================================

/// PID gains and output range
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidConfig {
    /// Controller gains
    pub gains: PidGains,
    /// Lowest controller output
    pub output_min: f32,
    /// Highest controller output
    pub output_max: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            output_min: 0.0,
            output_max: 100.0,
        }
    }
}

impl PidConfig {
    /// Set the gains
    pub fn with_gains(mut self, kp: f32, ki: f32, kd: f32) -> Self {
        self.gains = PidGains::new(kp, ki, kd);
        self
    }

    /// Set the output range
    pub fn with_output_range(mut self, min: f32, max: f32) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }

    /// Gains must be valid and the output range ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gains.validate()?;
        check_bounds("pid output", self.output_min, self.output_max)
    }
}

// ============================================================================
// Actuator Config
// ============================================================================

/// How the heater output is driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaterMode {
    /// Write the duty directly (PWM-capable driver).
    Pwm,
    /// Switch fully on or off within a fixed window (relay/SSR).
    TimeProportional {
        /// Window length in milliseconds
        window_ms: u32,
    },
}

impl Default for HeaterMode {
    fn default() -> Self {
        HeaterMode::TimeProportional { window_ms: 2000 }
    }
}

/// Heater and drum motor limits
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorConfig {
    /// Heater drive mode
    pub heater_mode: HeaterMode,
    /// Heater duty ceiling in percent (at most 100)
    pub max_safe_duty: u8,
    /// Lowest drum speed while roasting, in percent
    pub motor_min: u8,
    /// Highest drum speed, in percent
    pub motor_max: u8,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            heater_mode: HeaterMode::default(),
            max_safe_duty: 85,
            motor_min: 30,
            motor_max: 100,
        }
    }
}

impl ActuatorConfig {
    /// Set the heater drive mode
    pub fn with_heater_mode(mut self, mode: HeaterMode) -> Self {
        self.heater_mode = mode;
        self
    }

    /// Set the heater duty ceiling
    pub fn with_max_safe_duty(mut self, duty: u8) -> Self {
        self.max_safe_duty = duty;
        self
    }

    /// Set the drum speed range
    pub fn with_motor_range(mut self, min: u8, max: u8) -> Self {
        self.motor_min = min;
        self.motor_max = max;
        self
    }

    /// Duty ceiling at most 100, ordered motor range, non-empty window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_safe_duty > 100 {
            return Err(ConfigError::InvalidValue {
                what: "max_safe_duty",
            });
        }
        if self.motor_max > 100 {
            return Err(ConfigError::InvalidValue { what: "motor_max" });
        }
        if self.motor_max < self.motor_min {
            return Err(ConfigError::InvertedBounds {
                what: "motor speed",
                low: self.motor_min as f32,
                high: self.motor_max as f32,
            });
        }
        if let HeaterMode::TimeProportional { window_ms: 0 } = self.heater_mode {
            return Err(ConfigError::InvalidValue {
                what: "heater window",
            });
        }
        Ok(())
    }
}

// ============================================================================
// Loop Config
// ============================================================================

/// Tick cadence and fault handling
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopConfig {
    /// Tick period in milliseconds
    pub tick_ms: u32,
    /// Consecutive invalid readings before faulting
    pub fault_threshold: u8,
    /// Leave `Faulted` when the encoder is turned back to 0
    pub reset_on_zero_setpoint: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            fault_threshold: 3,
            reset_on_zero_setpoint: true,
        }
    }
}

impl LoopConfig {
    /// Set the tick period
    pub fn with_tick_ms(mut self, ms: u32) -> Self {
        self.tick_ms = ms;
        self
    }

    /// Set the fault threshold
    pub fn with_fault_threshold(mut self, n: u8) -> Self {
        self.fault_threshold = n;
        self
    }

    /// Set whether turning the encoder to 0 clears a fault
    pub fn with_reset_on_zero_setpoint(mut self, enabled: bool) -> Self {
        self.reset_on_zero_setpoint = enabled;
        self
    }

    /// Tick period and threshold must be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidValue { what: "tick_ms" });
        }
        if self.fault_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                what: "fault_threshold",
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.sensor.r_ref, 430.0);
        assert_eq!(config.sensor.r_nominal, 100.0);
        assert_eq!(config.pid.gains, PidGains::new(35.0, 1.0, 0.0));
        assert_eq!(config.control.fault_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_pins_match_original_wiring() {
        let pins = PinConfig::default();
        assert_eq!(pins.drum_motor, 16);
        assert_eq!(pins.potentiometer, Some(17));
        assert_eq!(pins.encoder_a, 4);
        assert_eq!(pins.encoder_b, 0);
        assert_eq!(pins.heater_ssr, 5);
        assert!(pins.validate().is_ok());
        assert!(PinConfig::esp32c3().validate().is_ok());
    }

    #[test]
    fn duplicate_pin_rejected() {
        let pins = PinConfig::default().with_drum_motor(5);
        assert_eq!(
            pins.validate(),
            Err(ConfigError::DuplicatePin {
                pin: 5,
                first: "heater_ssr",
                second: "drum_motor",
            })
        );
    }

    #[test]
    fn out_of_range_pin_rejected() {
        let pins = PinConfig::default().with_rtd_cs(40);
        assert_eq!(
            pins.validate(),
            Err(ConfigError::InvalidPin {
                what: "rtd_cs",
                pin: 40
            })
        );
    }

    #[test]
    fn potentiometer_is_optional() {
        // Without a pot, pin 17 is free for another role
        let pins = PinConfig::default()
            .with_potentiometer(None)
            .with_rtd_cs(17);
        assert!(pins.validate().is_ok());
    }

    #[test]
    fn inverted_pid_output_rejected() {
        let config = Config::default().with_pid(PidConfig::default().with_output_range(100.0, 0.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedBounds { what: "pid output", .. })
        ));
    }

    #[test]
    fn negative_gain_rejected() {
        let config = Config::default().with_pid(PidConfig::default().with_gains(35.0, -1.0, 0.0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGain { name: "ki", .. })
        ));
    }

    #[test]
    fn unsafe_duty_rejected() {
        let actuator = ActuatorConfig::default().with_max_safe_duty(101);
        assert!(actuator.validate().is_err());
        assert!(ActuatorConfig::default()
            .with_max_safe_duty(100)
            .validate()
            .is_ok());
    }

    #[test]
    fn inverted_motor_range_rejected() {
        let actuator = ActuatorConfig::default().with_motor_range(80, 20);
        assert!(matches!(
            actuator.validate(),
            Err(ConfigError::InvertedBounds { what: "motor speed", .. })
        ));
    }

    #[test]
    fn zero_heater_window_rejected() {
        let actuator = ActuatorConfig::default()
            .with_heater_mode(HeaterMode::TimeProportional { window_ms: 0 });
        assert!(actuator.validate().is_err());
    }

    #[test]
    fn heater_window_must_hold_whole_ticks() {
        let window = |ms| {
            Config::default()
                .with_actuator(ActuatorConfig::default().with_heater_mode(
                    HeaterMode::TimeProportional { window_ms: ms },
                ))
        };
        let rejected = Err(ConfigError::InvalidValue {
            what: "heater window vs tick",
        });

        assert_eq!(window(1750).validate(), rejected);
        assert_eq!(window(500).validate(), rejected);
        assert!(window(1000).validate().is_ok());
        assert!(window(5000).validate().is_ok());

        // PWM has no window to check
        let pwm = Config::default()
            .with_actuator(ActuatorConfig::default().with_heater_mode(HeaterMode::Pwm))
            .with_control(LoopConfig::default().with_tick_ms(300));
        assert!(pwm.validate().is_ok());
    }

    #[test]
    fn zero_tick_rejected() {
        assert!(LoopConfig::default().with_tick_ms(0).validate().is_err());
        assert!(LoopConfig::default()
            .with_fault_threshold(0)
            .validate()
            .is_err());
    }

    #[test]
    fn degenerate_input_range_rejected() {
        let sensor = SensorConfig::default().with_setpoint_input(InputRange::new(10, 10));
        assert_eq!(
            sensor.validate(),
            Err(ConfigError::InvalidValue {
                what: "setpoint_input"
            })
        );
    }

    #[test]
    fn bad_resistances_rejected() {
        assert!(SensorConfig::default()
            .with_resistances(0.0, 100.0)
            .validate()
            .is_err());
        assert!(SensorConfig::default()
            .with_resistances(430.0, f32::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn input_range_identity() {
        let range = InputRange::new(0, 450);
        assert_eq!(range.scale(0, 450), 0);
        assert_eq!(range.scale(225, 450), 225);
        assert_eq!(range.scale(450, 450), 450);
    }

    #[test]
    fn input_range_clamps() {
        let range = InputRange::new(0, 450);
        assert_eq!(range.scale(-20, 450), 0);
        assert_eq!(range.scale(9000, 450), 450);
    }

    #[test]
    fn input_range_adc_to_percent() {
        let range = InputRange::new(0, 1023);
        assert_eq!(range.scale(0, 100), 0);
        assert_eq!(range.scale(1023, 100), 100);
        assert_eq!(range.scale(512, 100), 50);
    }

    #[test]
    fn input_range_reversed() {
        let range = InputRange::new(1023, 0);
        assert_eq!(range.scale(1023, 100), 0);
        assert_eq!(range.scale(0, 100), 100);
    }

    #[test]
    fn input_range_extreme_raw_values() {
        let range = InputRange::new(0, 450);
        assert_eq!(range.scale(i32::MAX, 450), 450);
        assert_eq!(range.scale(i32::MIN, 450), 0);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_device(DeviceConfig::default().with_name("Garage Roaster"))
            .with_pins(PinConfig::esp32c3())
            .with_setpoint(SetpointConfig::default().with_scale(1.0).with_offset(100.0))
            .with_actuator(ActuatorConfig::default().with_heater_mode(HeaterMode::Pwm))
            .with_control(LoopConfig::default().with_tick_ms(250));

        assert_eq!(config.device.name.as_str(), "Garage Roaster");
        assert_eq!(config.pins.heater_ssr, 10);
        assert_eq!(config.setpoint.offset, 100.0);
        assert_eq!(config.actuator.heater_mode, HeaterMode::Pwm);
        assert_eq!(config.control.tick_ms, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert_eq!(s.len(), MAX_SHORT_STRING);
    }

    #[test]
    fn short_string_utf8_boundary() {
        // 3-byte characters: 21 fit in 64 bytes
        let input = "☕".repeat(30);
        let s = short_string(&input);
        assert_eq!(s.len(), 63);
        assert!(core::str::from_utf8(s.as_bytes()).is_ok());
    }
}
