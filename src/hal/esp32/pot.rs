//! Drum speed potentiometer via the ESP32 ADC.
//!
//! # Wiring
//!
//! - Wiper → GPIO0 (ADC1 channel 0)
//! - Ends → 3.3V and GND
//!
//! With 11 dB attenuation the full 0-3.3V swing reads 0-4095; set
//! [`SensorConfig::speed_input`](crate::config::SensorConfig::speed_input)
//! to `InputRange::new(0, 4095)` accordingly.

use crate::traits::PositionInput;
use esp_idf_hal::adc::attenuation::DB_11;
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::Gpio0;
use esp_idf_hal::peripheral::Peripheral;

/// Potentiometer on ADC1.
///
/// # Example
///
/// ```ignore
/// use rs_roaster::hal::esp32::Esp32Pot;
/// use rs_roaster::traits::PositionInput;
///
/// let peripherals = Peripherals::take()?;
/// let adc1 = AdcDriver::new(peripherals.adc1)?;
/// let mut pot = Esp32Pot::new(&adc1, peripherals.pins.gpio0)?;
/// let raw = pot.read_position(); // 0..=4095
/// ```
pub struct Esp32Pot<'d> {
    channel: AdcChannelDriver<'d, Gpio0, &'d AdcDriver<'d, ADC1>>,
    last_raw: u16,
}

impl<'d> Esp32Pot<'d> {
    /// Full-scale raw reading.
    pub const RAW_MAX: u16 = 4095;

    /// Creates the ADC channel.
    ///
    /// # Errors
    ///
    /// Returns an error if ADC channel initialization fails.
    pub fn new(
        adc: &'d AdcDriver<'d, ADC1>,
        pin: impl Peripheral<P = Gpio0> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let channel = AdcChannelDriver::new(adc, pin, &config)?;

        Ok(Self {
            channel,
            last_raw: 0,
        })
    }

    /// Last raw sample.
    #[inline]
    pub fn raw(&self) -> u16 {
        self.last_raw
    }
}

impl PositionInput for Esp32Pot<'_> {
    /// Samples the wiper. A failed conversion repeats the last good value.
    fn read_position(&mut self) -> i32 {
        match self.channel.read() {
            Ok(raw) => self.last_raw = raw.min(Self::RAW_MAX),
            Err(err) => tracing::warn!(?err, "speed pot read failed"),
        }
        self.last_raw as i32
    }
}
