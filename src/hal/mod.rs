//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`] for various platforms.
//!
//! # Available Implementations
//!
//! - `mock`: Test implementations for desktop development
//! - `max31865`: Generic MAX31865 RTD amplifier driver over `embedded-hal` 1.0
//!   (requires `max31865` feature)
//! - `esp32`: ESP32-C3 SuperMini with SSR heater and PWM drum (requires `esp32` feature)

pub mod mock;

#[cfg(feature = "max31865")]
pub mod max31865;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use mock::*;

#[cfg(feature = "max31865")]
pub use max31865::Max31865;

#[cfg(feature = "esp32")]
pub use esp32::*;
