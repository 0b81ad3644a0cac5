//! Host-side roast simulation.
//!
//! Runs the control loop against a lumped thermal model of a drum roaster,
//! with simulated RTD, heater and drum drivers, and logs the curve.
//!
//! # Usage
//!
//! ```bash
//! cargo run --features sim --bin roast_sim -- [SETPOINT_F] [SECONDS] [--dropout SECONDS]
//! ```
//!
//! `--dropout` opens the probe at the given time for two seconds, long
//! enough to latch a fault.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::bail;
use clap::Parser;
use rs_roaster::hal::{MockClock, MockPosition};
use rs_roaster::sensor::{celsius_to_fahrenheit, celsius_to_resistance, resistance_to_code};
use rs_roaster::traits::{Clock, DrumMotor, FixedPosition, HeaterOutput, RtdFault, RtdSensor};
use rs_roaster::{Config, ControlLoop, LoopCommand, LoopMode};

/// Log a line every this many simulated milliseconds
const LOG_INTERVAL_MS: u64 = 10_000;

// ============================================================================
// Thermal Plant
// ============================================================================

/// Drum, air and beans as one thermal mass.
#[derive(Debug)]
struct Plant {
    temp_c: f32,
    ambient_c: f32,
    /// Heater level, 0.0 to 1.0
    heater: f32,
    /// Drum speed, 0 to 100
    drum: u8,
    probe_open: bool,
}

impl Plant {
    /// Element power (W)
    const HEATER_W: f32 = 1600.0;
    /// Heat capacity (J/K)
    const CAPACITY_J_PER_K: f32 = 2200.0;
    /// Loss to ambient at rest (W/K)
    const LOSS_W_PER_K: f32 = 2.2;
    /// Extra loss at full drum speed (W/K)
    const DRUM_LOSS_W_PER_K: f32 = 0.8;

    fn new(ambient_c: f32) -> Self {
        Self {
            temp_c: ambient_c,
            ambient_c,
            heater: 0.0,
            drum: 0,
            probe_open: false,
        }
    }

    fn step(&mut self, dt_s: f32) {
        let loss = Self::LOSS_W_PER_K + Self::DRUM_LOSS_W_PER_K * self.drum as f32 / 100.0;
        let power = Self::HEATER_W * self.heater - loss * (self.temp_c - self.ambient_c);
        self.temp_c += power / Self::CAPACITY_J_PER_K * dt_s;
    }
}

type Shared = Rc<RefCell<Plant>>;

// ============================================================================
// Simulated Drivers
// ============================================================================

struct SimRtd {
    plant: Shared,
    r_ref: f32,
    r_nominal: f32,
    fault: RtdFault,
}

impl RtdSensor for SimRtd {
    type Error = core::convert::Infallible;

    fn read_rtd(&mut self) -> Result<u16, Self::Error> {
        let plant = self.plant.borrow();
        if plant.probe_open {
            self.fault = RtdFault::from_bits(RtdFault::RTD_HIGH_THRESHOLD);
            return Ok(0x7FFF);
        }
        let resistance = celsius_to_resistance(plant.temp_c, self.r_nominal);
        Ok(resistance_to_code(resistance, self.r_ref))
    }

    fn read_fault(&mut self) -> Result<RtdFault, Self::Error> {
        Ok(self.fault)
    }

    fn clear_fault(&mut self) -> Result<(), Self::Error> {
        self.fault = RtdFault::NONE;
        Ok(())
    }
}

struct SimHeater(Shared);

impl HeaterOutput for SimHeater {
    type Error = core::convert::Infallible;

    fn set_duty(&mut self, duty_percent: u8) -> Result<(), Self::Error> {
        self.0.borrow_mut().heater = duty_percent.min(100) as f32 / 100.0;
        Ok(())
    }
}

struct SimDrum(Shared);

impl DrumMotor for SimDrum {
    type Error = core::convert::Infallible;

    fn set_speed(&mut self, speed_percent: u8) -> Result<(), Self::Error> {
        self.0.borrow_mut().drum = speed_percent.min(100);
        Ok(())
    }
}

// ============================================================================
// Arguments
// ============================================================================

#[derive(Parser)]
#[command(name = "roast_sim")]
#[command(about = "Simulated drum roast against a lumped thermal model", long_about = None)]
struct Args {
    /// Target bean temperature in °F (0 to 450)
    #[arg(default_value_t = 420.0)]
    setpoint_f: f32,
    /// Roast length in seconds
    #[arg(default_value_t = 600)]
    seconds: u64,
    /// Open the probe at this time (seconds) for two seconds
    #[arg(long, value_name = "SECONDS")]
    dropout: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::default();
    config.validate()?;

    let plant = Rc::new(RefCell::new(Plant::new(22.0)));
    let rtd = SimRtd {
        plant: plant.clone(),
        r_ref: config.sensor.r_ref,
        r_nominal: config.sensor.r_nominal,
        fault: RtdFault::NONE,
    };

    let mut roaster = ControlLoop::new(
        &config,
        rtd,
        MockPosition::at(args.setpoint_f.round() as i32),
        FixedPosition(config.sensor.speed_input.raw_max * 3 / 4),
        SimHeater(plant.clone()),
        SimDrum(plant.clone()),
    )?;

    let tick_ms = config.control.tick_ms as u64;
    let end_ms = args.seconds * 1000;
    let dropout = args.dropout.map(|s| s * 1000..s * 1000 + 2000);

    tracing::info!(
        setpoint_f = args.setpoint_f,
        seconds = args.seconds,
        ambient_f = celsius_to_fahrenheit(plant.borrow().ambient_c),
        "starting simulated roast"
    );
    if roaster.submit(LoopCommand::Start).is_err() {
        bail!("command queue full at startup");
    }

    let mut clock = MockClock::new();
    while clock.now_ms() <= end_ms {
        let now = clock.now_ms();
        plant.borrow_mut().probe_open = dropout.as_ref().is_some_and(|r| r.contains(&now));

        let report = roaster.tick(now);

        if report.mode == LoopMode::Faulted {
            tracing::warn!(t_s = now / 1000, "roaster faulted, resetting");
            if roaster.submit(LoopCommand::Reset).is_err()
                || roaster.submit(LoopCommand::Start).is_err()
            {
                bail!("command queue full");
            }
        }

        if now % LOG_INTERVAL_MS == 0 {
            let state = roaster.state();
            tracing::info!(
                t_s = now / 1000,
                mode = %state.mode,
                bean_f = ?state.temperature_f.map(|t| (t * 10.0).round() / 10.0),
                setpoint_f = state.setpoint_f,
                heater = state.heater_duty,
                drum = state.motor_speed,
                "roast"
            );
        }

        plant.borrow_mut().step(tick_ms as f32 / 1000.0);
        clock.advance(tick_ms);
    }

    let final_f = celsius_to_fahrenheit(plant.borrow().temp_c);
    let error_f = final_f - args.setpoint_f;
    tracing::info!(final_f, error_f, "roast finished");
    Ok(())
}
