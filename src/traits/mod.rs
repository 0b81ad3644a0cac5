//! Trait definitions for hardware abstraction.
//!
//! This module defines the core abstractions that allow rs-roaster to run
//! the same control loop on the ESP32, on the host simulator, and against
//! test doubles.
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`RtdSensor`]: RTD amplifier conversion and fault status
//! - [`PositionInput`]: Rotary encoder or potentiometer position
//! - [`HeaterOutput`]: Heater SSR or PWM drive
//! - [`DrumMotor`]: Drum motor PWM
//! - [`Clock`]: Time source for `no_std` environments

pub mod hardware;

pub use hardware::*;
