//! ESP32-C3 SuperMini roaster controller.
//!
//! This is the main entry point for the physical hardware controller.
//! The setpoint encoder is decoded on its own thread, since each control
//! tick blocks for about 75 ms in the RTD conversion. The main thread runs a
//! control tick on the configured cadence (500 ms by default) that:
//! - Reads bean temperature from the MAX31865
//! - Maps the encoder to a setpoint and the pot to a drum speed
//! - Runs the PID and drives the heater SSR and drum PWM
//!
//! The encoder doubles as the start/stop control: turning it off zero
//! starts a roast, turning it back to zero stops it (or clears a fault).
//!
//! GPIO numbers below are fixed by the board. Startup fails if
//! [`PinConfig::esp32c3`] disagrees with them.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! espflash flash --monitor target/riscv32imc-esp-espidf/release/esp32_main
//! ```

use anyhow::bail;
use embedded_hal::spi::MODE_1;
use esp_idf_hal::adc::oneshot::AdcDriver;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::Pin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::config::{Config as SpiConfig, DriverConfig};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver};
use rs_roaster::hal::esp32::{Esp32Clock, Esp32Encoder, Esp32Motor, Esp32Pot, Esp32Ssr};
use rs_roaster::hal::Max31865;
use rs_roaster::traits::{Clock, PositionInput};
use rs_roaster::{
    Config, ControlLoop, DeviceConfig, InputRange, LoopCommand, LoopMode, PinConfig, SensorConfig,
};
use std::thread;
use std::time::Duration;

/// Encoder polling interval in milliseconds
const POLL_INTERVAL_MS: u64 = 1;

/// Log a status line every this many ticks (10 s at 500 ms)
const STATUS_INTERVAL_TICKS: u32 = 20;

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .init();

    tracing::info!("rs-roaster SuperMini controller starting");

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default()
        .with_device(DeviceConfig::default().with_name("rs-roaster-c3"))
        .with_pins(PinConfig::esp32c3())
        .with_sensor(
            SensorConfig::default()
                .with_speed_input(InputRange::new(0, Esp32Pot::RAW_MAX as i32)),
        );
    config.validate()?;
    tracing::info!(device = %config.device.name, pins = ?config.pins, "configuration ok");

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Wiring check
    // =========================================================================
    let pins = &config.pins;
    check_pin("rtd_cs", peripherals.pins.gpio7.pin(), pins.rtd_cs)?;
    check_pin("encoder_a", peripherals.pins.gpio1.pin(), pins.encoder_a)?;
    check_pin("encoder_b", peripherals.pins.gpio2.pin(), pins.encoder_b)?;
    check_pin("heater_ssr", peripherals.pins.gpio10.pin(), pins.heater_ssr)?;
    check_pin("drum_motor", peripherals.pins.gpio3.pin(), pins.drum_motor)?;
    let Some(pot_pin) = pins.potentiometer else {
        bail!("the SuperMini build needs a drum speed potentiometer");
    };
    check_pin("potentiometer", peripherals.pins.gpio0.pin(), pot_pin)?;

    // =========================================================================
    // Initialize RTD amplifier (MAX31865 on SPI2, CS GPIO7)
    // =========================================================================
    let spi = SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio4,       // SCLK
        peripherals.pins.gpio6,       // MOSI
        Some(peripherals.pins.gpio5), // MISO
        &DriverConfig::new(),
    )?;
    let spi_config = SpiConfig::new().baudrate(1.MHz().into()).data_mode(MODE_1);
    let rtd_device = SpiDeviceDriver::new(spi, Some(peripherals.pins.gpio7), &spi_config)?;
    let rtd = Max31865::new(rtd_device, FreeRtos, config.sensor.wires, config.sensor.filter)
        .map_err(|e| anyhow::anyhow!("MAX31865 init failed: {:?}", e))?;
    tracing::info!("rtd amplifier initialized");

    // =========================================================================
    // Initialize inputs (encoder GPIO1/2, speed pot GPIO0)
    // =========================================================================
    let encoder = Esp32Encoder::new(peripherals.pins.gpio1, peripherals.pins.gpio2)?
        .spawn_polling(Duration::from_millis(POLL_INTERVAL_MS))?;
    let adc1 = AdcDriver::new(peripherals.adc1)?;
    let pot = Esp32Pot::new(&adc1, peripherals.pins.gpio0)?;
    tracing::info!("encoder and speed pot initialized");

    // =========================================================================
    // Initialize outputs (SSR GPIO10, drum PWM GPIO3)
    // =========================================================================
    let heater = Esp32Ssr::new(peripherals.pins.gpio10)?;
    let motor = Esp32Motor::new(
        peripherals.pins.gpio3,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
    )?;
    tracing::info!("heater and drum outputs initialized");

    // =========================================================================
    // Initialize Clock and Controller
    // =========================================================================
    let clock = Esp32Clock::new();
    let mut roaster = ControlLoop::new(&config, rtd, encoder, pot, heater, motor)?;
    let tick_ms = config.control.tick_ms as u64;

    tracing::info!(tick_ms, "starting control loop, turn the knob to start");

    let mut next_tick = clock.now_ms();
    let mut tick_count: u32 = 0;

    // =========================================================================
    // Main Loop
    // =========================================================================
    loop {
        let now = clock.now_ms();
        if now < next_tick {
            thread::sleep(Duration::from_millis(next_tick - now));
            continue;
        }
        let position = roaster.sensors_mut().encoder_mut().read_position();

        // ---------------------------------------------------------------------
        // Knob start/stop
        // ---------------------------------------------------------------------
        let command = match (roaster.mode(), position) {
            (LoopMode::Idle, p) if p > 0 => Some(LoopCommand::Start),
            (LoopMode::Running, 0) => Some(LoopCommand::Stop),
            _ => None,
        };
        if let Some(cmd) = command {
            if let Err(cmd) = roaster.submit(cmd) {
                tracing::warn!(?cmd, "command queue full");
            }
        }

        // ---------------------------------------------------------------------
        // Control tick
        // ---------------------------------------------------------------------
        let report = roaster.tick(now);
        if let Some(err) = report.actuator_error {
            tracing::error!(%err, "actuator failure");
        }

        tick_count = tick_count.wrapping_add(1);
        if tick_count % STATUS_INTERVAL_TICKS == 0 {
            let state = roaster.state();
            tracing::info!(
                mode = %state.mode,
                temperature_f = ?state.temperature_f,
                setpoint_f = state.setpoint_f,
                heater = state.heater_duty,
                drum = state.motor_speed,
                "status"
            );
        }

        // Missed deadlines are skipped, not replayed
        next_tick += tick_ms;
        if next_tick <= now {
            next_tick = now + tick_ms;
        }
    }
}

/// Fails startup when a board GPIO differs from the validated pin map.
fn check_pin(role: &str, wired: i32, configured: u8) -> anyhow::Result<()> {
    if wired != i32::from(configured) {
        bail!("{role} is wired to GPIO{wired} but configured as GPIO{configured}");
    }
    Ok(())
}
