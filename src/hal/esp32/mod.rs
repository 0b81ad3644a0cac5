//! ESP32-C3 SuperMini hardware abstraction layer for the roaster.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **RTD**: PT100 probe on an Adafruit MAX31865 board (SPI2)
//! - **Heater**: zero-cross solid-state relay
//! - **Drum**: DC gear motor through a logic-level MOSFET (LEDC PWM)
//! - **Setpoint**: KY-040 rotary encoder
//! - **Drum speed**: 10k potentiometer on ADC1
//!
//! # Pin Assignments
//!
//! See the [`pins`] module. The same layout is available as
//! [`PinConfig::esp32c3`](crate::config::PinConfig::esp32c3) for startup
//! validation.

mod clock;
mod encoder;
mod motor;
mod pot;
mod ssr;

pub use clock::Esp32Clock;
pub use encoder::{Esp32Encoder, SharedPosition};
pub use motor::Esp32Motor;
pub use pot::Esp32Pot;
pub use ssr::Esp32Ssr;

/// Pin assignments for SuperMini ESP32-C3.
pub mod pins {
    // =========================================================================
    // Outputs
    // =========================================================================

    /// Heater SSR control (active high)
    pub const HEATER_SSR: i32 = 10;

    /// Drum motor PWM
    pub const DRUM_MOTOR: i32 = 3;

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Drum speed potentiometer wiper (ADC1 channel 0)
    pub const SPEED_POT: i32 = 0;

    /// Encoder clock/A signal
    pub const ENC_CLK: i32 = 1;

    /// Encoder data/B signal
    pub const ENC_DT: i32 = 2;

    // =========================================================================
    // SPI (MAX31865)
    // =========================================================================

    /// SPI clock
    pub const SPI_SCLK: i32 = 4;

    /// SPI MISO (MAX31865 SDO)
    pub const SPI_MISO: i32 = 5;

    /// SPI MOSI (MAX31865 SDI)
    pub const SPI_MOSI: i32 = 6;

    /// MAX31865 chip select (active low)
    pub const RTD_CS: i32 = 7;
}
