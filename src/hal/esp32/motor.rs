//! Drum motor PWM through a low-side MOSFET, using the ESP32 LEDC peripheral.

use crate::traits::DrumMotor;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// Drum motor on one LEDC channel.
///
/// 20kHz, 10-bit resolution (1024 duty steps).
///
/// # Example
///
/// ```ignore
/// use rs_roaster::hal::esp32::Esp32Motor;
/// use rs_roaster::traits::DrumMotor;
///
/// let peripherals = Peripherals::take()?;
/// let mut drum = Esp32Motor::new(
///     peripherals.pins.gpio3,
///     peripherals.ledc.timer0,
///     peripherals.ledc.channel0,
/// )?;
///
/// drum.set_speed(60)?;
/// ```
pub struct Esp32Motor<'d> {
    pwm: LedcDriver<'d>,
    speed: u8,
}

impl<'d> Esp32Motor<'d> {
    /// PWM frequency in Hz (20kHz is above audible range)
    const PWM_FREQ_HZ: u32 = 20_000;

    /// PWM resolution (10-bit = 1024 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits10;

    /// Maximum duty value for 10-bit resolution
    const MAX_DUTY: u32 = 1023;

    /// Creates the driver with the motor stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if LEDC initialization fails.
    pub fn new<T, TI, C, CI, P, PI>(
        pwm_pin: P,
        timer: T,
        channel: C,
    ) -> Result<Self, esp_idf_hal::sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: esp_idf_hal::gpio::OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let pwm = LedcDriver::new(channel, &timer_driver, pwm_pin)?;

        let mut motor = Self { pwm, speed: 0 };
        motor.set_speed(0)?;
        Ok(motor)
    }

    /// Last speed written, in percent.
    #[inline]
    pub fn speed(&self) -> u8 {
        self.speed
    }
}

impl DrumMotor for Esp32Motor<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn set_speed(&mut self, speed_percent: u8) -> Result<(), Self::Error> {
        let speed = speed_percent.min(100);
        let duty = speed as u32 * Self::MAX_DUTY / 100;
        self.pwm.set_duty(duty)?;
        self.speed = speed;
        Ok(())
    }
}
