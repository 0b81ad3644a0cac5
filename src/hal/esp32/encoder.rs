//! KY-040 rotary encoder as the setpoint knob.
//!
//! Polling quadrature decoder that keeps an absolute count, bounded so the
//! knob stops at the ends of the setpoint range instead of winding past.
//!
//! The control tick blocks for about 75 ms in the MAX31865 one-shot read,
//! long enough to miss detents. [`Esp32Encoder::spawn_polling`] moves the
//! decoder onto its own thread and hands back a [`SharedPosition`] for the
//! loop. Polling runs at the FreeRTOS tick rate at best, so very fast turns
//! can still drop steps.
//!
//! # Wiring
//!
//! - CLK (A) → GPIO1
//! - DT (B) → GPIO2
//! - VCC → 3.3V
//! - GND → GND

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::sensor::EncoderPosition;
use crate::traits::PositionInput;
use esp_idf_hal::gpio::{Input, InputPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;

/// Stack for the polling thread
const POLL_STACK_BYTES: usize = 3072;

/// KY-040 rotary encoder for ESP32.
///
/// Either call [`poll()`](Self::poll) every couple of milliseconds, or hand
/// the encoder to [`spawn_polling`](Self::spawn_polling). The loop reads the
/// count through [`PositionInput`].
///
/// ```ignore
/// use rs_roaster::hal::esp32::Esp32Encoder;
/// use rs_roaster::traits::PositionInput;
///
/// let peripherals = Peripherals::take()?;
/// let mut encoder = Esp32Encoder::new(peripherals.pins.gpio1, peripherals.pins.gpio2)?;
///
/// loop {
///     encoder.poll();
///     let target = encoder.read_position();
/// }
/// ```
pub struct Esp32Encoder<'d, CLK, DT>
where
    CLK: InputPin + OutputPin,
    DT: InputPin + OutputPin,
{
    clk: PinDriver<'d, CLK, Input>,
    dt: PinDriver<'d, DT, Input>,
    last_clk: bool,
    position: i32,
    min: i32,
    max: i32,
}

impl<'d, CLK, DT> Esp32Encoder<'d, CLK, DT>
where
    CLK: InputPin + OutputPin,
    DT: InputPin + OutputPin,
{
    /// Configures both pins as inputs with pull-ups. Starts at 0, bounded
    /// to `[EncoderPosition::MIN, EncoderPosition::MAX]`.
    pub fn new(
        clk_pin: impl Peripheral<P = CLK> + 'd,
        dt_pin: impl Peripheral<P = DT> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut clk = PinDriver::input(clk_pin)?;
        let mut dt = PinDriver::input(dt_pin)?;

        // KY-040 outputs are open-drain
        clk.set_pull(Pull::Up)?;
        dt.set_pull(Pull::Up)?;

        let last_clk = clk.is_high();

        Ok(Self {
            clk,
            dt,
            last_clk,
            position: 0,
            min: EncoderPosition::MIN as i32,
            max: EncoderPosition::MAX as i32,
        })
    }

    /// Replaces the count bounds.
    pub fn with_limits(mut self, min: i32, max: i32) -> Self {
        self.min = min;
        self.max = max;
        self.position = crate::clamp::clamp(self.position, min, max);
        self
    }

    /// Samples the pins and updates the count on a CLK rising edge.
    pub fn poll(&mut self) {
        let clk = self.clk.is_high();
        let dt = self.dt.is_high();

        if clk && !self.last_clk {
            // DT high = counter-clockwise
            let step = if dt { -1 } else { 1 };
            self.position = crate::clamp::clamp(self.position + step, self.min, self.max);
        }
        self.last_clk = clk;
    }

    /// Moves the count, within bounds.
    pub fn set_position(&mut self, position: i32) {
        self.position = crate::clamp::clamp(position, self.min, self.max);
    }
}

impl<CLK, DT> Esp32Encoder<'static, CLK, DT>
where
    CLK: InputPin + OutputPin + Send + 'static,
    DT: InputPin + OutputPin + Send + 'static,
{
    /// Polls the pins every `period` on a dedicated thread.
    pub fn spawn_polling(mut self, period: Duration) -> std::io::Result<SharedPosition> {
        let shared = SharedPosition(Arc::new(AtomicI32::new(self.position)));
        let count = shared.clone();

        thread::Builder::new()
            .name("encoder".into())
            .stack_size(POLL_STACK_BYTES)
            .spawn(move || loop {
                self.poll();
                count.0.store(self.position, Ordering::Relaxed);
                thread::sleep(period);
            })?;

        tracing::info!(?period, "encoder polling thread started");
        Ok(shared)
    }
}

/// Encoder count published by [`Esp32Encoder::spawn_polling`].
#[derive(Clone, Debug)]
pub struct SharedPosition(Arc<AtomicI32>);

impl PositionInput for SharedPosition {
    #[inline]
    fn read_position(&mut self) -> i32 {
        self.0.load(Ordering::Relaxed)
    }
}

impl<CLK, DT> PositionInput for Esp32Encoder<'_, CLK, DT>
where
    CLK: InputPin + OutputPin,
    DT: InputPin + OutputPin,
{
    #[inline]
    fn read_position(&mut self) -> i32 {
        self.position
    }
}
