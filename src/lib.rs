//! # rs-roaster
//!
//! A closed-loop PID temperature controller for an ESP-class coffee roaster.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the RTD amplifier, setpoint knob, heater and drum motor
//! - **RTD conversion**: Callendar–Van Dusen conversion for PT100/PT1000 probes
//! - **PID control**: Anti-windup integral, derivative guard, runtime retuning
//! - **Safety limits**: Heater duty ceiling, drum speed floor, fault latch after repeated bad reads
//! - **SSR support**: Time-proportioned heater switching
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware abstractions
//! - `sensor` - RTD and knob readings
//! - `setpoint` - Knob position to target temperature
//! - `pid` - Control core
//! - `actuator` - Heater and drum drive with limits
//! - `control_loop` - Mode state machine that ties everything together
//! - `hal` - Concrete implementations (mock for testing, MAX31865, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_roaster::{
//!     Config, ControlLoop, LoopCommand, LoopMode,
//!     hal::{MockHeater, MockMotor, MockPosition, MockRtd},
//!     traits::FixedPosition,
//! };
//!
//! let config = Config::default();
//! let mut roaster = ControlLoop::new(
//!     &config,
//!     MockRtd::new(),
//!     MockPosition::at(420),
//!     FixedPosition(700),
//!     MockHeater::new(),
//!     MockMotor::new(),
//! )
//! .unwrap();
//!
//! roaster.submit(LoopCommand::Start).unwrap();
//!
//! // Call tick() on the configured cadence
//! for n in 0..4 {
//!     let report = roaster.tick(n * config.control.tick_ms as u64);
//!     assert_eq!(report.mode, LoopMode::Running);
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// Heater and drum motor drive with safety limits.
pub mod actuator;
/// Generic min/max/clamp over `PartialOrd`.
pub mod clamp;
/// Per-tick orchestration and the Idle/Running/Faulted state machine.
pub mod control_loop;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// PID controller with anti-windup.
pub mod pid;
/// RTD conversion and input readings.
pub mod sensor;
/// Encoder position to target temperature.
pub mod setpoint;
/// Core traits for hardware abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Error types.
pub mod error;

pub use actuator::{ActuatorDriver, HeaterCommand, MotorCommand};
pub use config::{
    ActuatorConfig, Config, DeviceConfig, HeaterMode, InputRange, LoopConfig, MainsFilter,
    PidConfig, PinConfig, RtdWires, SensorConfig, SetpointConfig,
};
pub use control_loop::{ControlLoop, LoopCommand, LoopMode, RoasterState, TickReport};
pub use error::{ActuatorError, ConfigError, SensorFault};
pub use pid::{PidController, PidGains, PidOutput, PidState};
pub use sensor::{EncoderPosition, SensorAdapter, TemperatureReading};
pub use setpoint::SetpointManager;
pub use traits::{Clock, DrumMotor, HeaterOutput, PositionInput, RtdFault, RtdSensor};
