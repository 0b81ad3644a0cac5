//! Heater solid-state relay on a GPIO output.

use crate::traits::HeaterOutput;
use esp_idf_hal::gpio::{Output, OutputPin, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

/// Zero-cross SSR driving the heater element.
///
/// The relay is binary: duties of 50% and above switch it on. Pair it with
/// [`HeaterMode::TimeProportional`](crate::config::HeaterMode::TimeProportional),
/// which only ever writes 0 or 100.
pub struct Esp32Ssr<'d, PIN>
where
    PIN: OutputPin,
{
    pin: PinDriver<'d, PIN, Output>,
    on: bool,
}

impl<'d, PIN> Esp32Ssr<'d, PIN>
where
    PIN: OutputPin,
{
    /// Duty at or above which the relay is closed.
    pub const ON_THRESHOLD: u8 = 50;

    /// Configures the pin as an output and opens the relay.
    pub fn new(pin: impl Peripheral<P = PIN> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin, on: false })
    }

    /// Whether the relay is currently closed.
    #[inline]
    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl<PIN> HeaterOutput for Esp32Ssr<'_, PIN>
where
    PIN: OutputPin,
{
    type Error = esp_idf_hal::sys::EspError;

    fn set_duty(&mut self, duty_percent: u8) -> Result<(), Self::Error> {
        let on = duty_percent >= Self::ON_THRESHOLD;
        if on {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.on = on;
        Ok(())
    }
}
