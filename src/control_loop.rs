//! The roaster control loop.
//!
//! [`ControlLoop`] owns the sensors, the PID state and the actuators, and
//! runs one closed-loop step per [`tick`](ControlLoop::tick).
//!
//! # Modes
//!
//! ```text
//!          Start                 N invalid readings
//!   Idle ────────▶ Running ─────────────────────────▶ Faulted
//!    ▲   ◀────────   │                                  │
//!    │     Stop      │                                  │
//!    └───────────────┴──── Stop / Reset / encoder at 0 ─┘
//! ```
//!
//! - `Idle`: heater and motor off.
//! - `Running`: read, compute setpoint, run PID, drive actuators.
//! - `Faulted`: heater forced off, drum keeps turning.
//!
//! Commands are queued with [`submit`](ControlLoop::submit) and take effect
//! at the start of the next tick.
//!
//! # Example
//!
//! ```rust
//! use rs_roaster::{Config, ControlLoop, LoopCommand, LoopMode};
//! use rs_roaster::hal::{MockHeater, MockMotor, MockPosition, MockRtd};
//! use rs_roaster::traits::FixedPosition;
//!
//! let mut rtd = MockRtd::new();
//! rtd.set_fahrenheit(300.0);
//!
//! let mut roaster = ControlLoop::new(
//!     &Config::default(),
//!     rtd,
//!     MockPosition::at(400),
//!     FixedPosition(1023),
//!     MockHeater::new(),
//!     MockMotor::new(),
//! )
//! .unwrap();
//!
//! roaster.submit(LoopCommand::Start).unwrap();
//! let report = roaster.tick(0);
//!
//! assert_eq!(report.mode, LoopMode::Running);
//! assert_eq!(report.setpoint_f, 400.0);
//! assert_eq!(report.heater.percent(), 85); // 100 °F below target, capped
//! assert_eq!(report.motor.percent(), 100);
//! ```

use core::fmt::{self, Debug};

use heapless::Deque;

use crate::actuator::{ActuatorDriver, HeaterCommand, MotorCommand};
use crate::config::{Config, LoopConfig};
use crate::error::{ActuatorError, ConfigError, SensorFault};
use crate::pid::{PidController, PidGains, PidOutput, PidState};
use crate::sensor::{EncoderPosition, SensorAdapter, TemperatureReading};
use crate::setpoint::SetpointManager;
use crate::traits::{DrumMotor, HeaterOutput, PositionInput, RtdSensor};

/// Commands that can be pending at one time.
pub const COMMAND_QUEUE_DEPTH: usize = 4;

/// Operating mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LoopMode {
    /// Heater and motor off, waiting for `Start`.
    #[default]
    Idle,
    /// Closed-loop control.
    Running,
    /// Too many invalid readings. Heater off, drum turning.
    Faulted,
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopMode::Idle => write!(f, "idle"),
            LoopMode::Running => write!(f, "running"),
            LoopMode::Faulted => write!(f, "faulted"),
        }
    }
}

/// Operator commands, applied at a tick boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LoopCommand {
    /// `Idle` to `Running`, with a fresh PID state. Ignored while `Faulted`.
    Start,
    /// `Running` or `Faulted` to `Idle`.
    Stop,
    /// `Faulted` to `Idle`.
    Reset,
}

/// What one tick observed and commanded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    /// Mode at the end of the tick.
    pub mode: LoopMode,
    /// Temperature reading after range validation.
    pub reading: TemperatureReading,
    /// Encoder position read this tick.
    pub position: EncoderPosition,
    /// Setpoint derived from the encoder.
    pub setpoint_f: f32,
    /// Controller step, when one ran.
    pub pid: Option<PidOutput>,
    /// Heater duty after this tick.
    pub heater: HeaterCommand,
    /// Drum speed after this tick.
    pub motor: MotorCommand,
    /// First actuator failure of the tick.
    pub actuator_error: Option<ActuatorError>,
}

/// Snapshot of the loop for diagnostics.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoasterState {
    /// Current mode.
    pub mode: LoopMode,
    /// Last valid temperature (°F), if the last reading was valid.
    pub temperature_f: Option<f32>,
    /// Most recent sensor fault.
    pub last_fault: Option<SensorFault>,
    /// Last computed setpoint (°F).
    pub setpoint_f: f32,
    /// Last PID output.
    pub output: f32,
    /// Commanded heater duty (%).
    pub heater_duty: u8,
    /// Commanded drum speed (%).
    pub motor_speed: u8,
    /// Consecutive invalid readings while running.
    pub invalid_streak: u8,
    /// PID integral accumulator.
    pub integral: f32,
}

/// Closed-loop roaster controller.
///
/// Not thread-safe; the firmware drives it from a single loop.
///
/// # Type Parameters
///
/// - `S`: RTD amplifier
/// - `E`: setpoint encoder
/// - `P`: drum speed input
/// - `H`: heater output
/// - `M`: drum motor
pub struct ControlLoop<S, E, P, H, M> {
    sensors: SensorAdapter<S, E, P>,
    setpoints: SetpointManager,
    pid: PidController,
    pid_state: PidState,
    actuators: ActuatorDriver<H, M>,
    control: LoopConfig,
    plausible_f: (f32, f32),
    mode: LoopMode,
    commands: Deque<LoopCommand, COMMAND_QUEUE_DEPTH>,
    invalid_streak: u8,
    /// Set once the encoder is seen off zero while faulted
    zero_reset_armed: bool,
    last_reading: Option<TemperatureReading>,
    last_fault: Option<SensorFault>,
    last_setpoint: f32,
    last_output: f32,
}

impl<S, E, P, H, M> ControlLoop<S, E, P, H, M>
where
    S: RtdSensor,
    S::Error: Debug,
    E: PositionInput,
    P: PositionInput,
    H: HeaterOutput,
    H::Error: Debug,
    M: DrumMotor,
    M::Error: Debug,
{
    /// Builds a loop in `Idle` from a validated configuration.
    pub fn new(
        config: &Config,
        rtd: S,
        encoder: E,
        speed: P,
        heater: H,
        motor: M,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let pid = PidController::from_config(&config.pid)?;

        Ok(Self {
            sensors: SensorAdapter::new(rtd, encoder, speed, config.sensor.clone()),
            setpoints: SetpointManager::new(&config.setpoint),
            pid,
            pid_state: PidState::new(),
            actuators: ActuatorDriver::new(
                heater,
                motor,
                config.actuator.clone(),
                config.control.tick_ms,
            ),
            control: config.control.clone(),
            plausible_f: (config.sensor.plausible_min_f, config.sensor.plausible_max_f),
            mode: LoopMode::Idle,
            commands: Deque::new(),
            invalid_streak: 0,
            zero_reset_armed: false,
            last_reading: None,
            last_fault: None,
            last_setpoint: 0.0,
            last_output: 0.0,
        })
    }

    /// Queues a command for the next tick. Returns it back if the queue is full.
    pub fn submit(&mut self, cmd: LoopCommand) -> Result<(), LoopCommand> {
        self.commands.push_back(cmd)
    }

    /// Runs one control step.
    ///
    /// Pending commands are applied first. Failures are classified into the
    /// report, never returned.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        while let Some(cmd) = self.commands.pop_front() {
            self.apply_command(cmd);
        }

        let (min_f, max_f) = self.plausible_f;
        let reading = self.sensors.read_temperature_f().validated(min_f, max_f);
        let position = self.sensors.read_encoder_position();
        let setpoint_f = self.setpoints.current_setpoint(position);

        if let Some(fault) = reading.fault() {
            self.last_fault = Some(fault);
        }

        let mut actuator_error = None;
        let mut pid = None;

        match self.mode {
            LoopMode::Idle => {
                note(&mut actuator_error, self.actuators.de_energize());
            }

            LoopMode::Running => {
                let speed = self.sensors.read_motor_speed();
                let motor = self.actuators.apply_motor(speed);
                let motor_ok = motor.is_ok();
                note(&mut actuator_error, motor);

                match reading {
                    TemperatureReading::Valid(measured) => {
                        self.invalid_streak = 0;
                        let step = self
                            .pid
                            .compute_at(setpoint_f, measured, now_ms, &mut self.pid_state);
                        self.last_output = step.output;
                        pid = Some(step);

                        if motor_ok {
                            note(
                                &mut actuator_error,
                                self.actuators.apply_heater(step.output, now_ms),
                            );
                        } else {
                            note(&mut actuator_error, self.actuators.heater_off());
                        }
                    }
                    TemperatureReading::Invalid(fault) => {
                        self.invalid_streak = self.invalid_streak.saturating_add(1);
                        tracing::warn!(
                            %fault,
                            streak = self.invalid_streak,
                            "invalid reading, heater off"
                        );
                        note(&mut actuator_error, self.actuators.heater_off());

                        if self.invalid_streak >= self.control.fault_threshold {
                            self.transition(LoopMode::Faulted);
                        }
                    }
                }
            }

            LoopMode::Faulted => {
                // Only a return to zero counts
                if position.get() != 0 {
                    self.zero_reset_armed = true;
                }
                if self.control.reset_on_zero_setpoint
                    && self.zero_reset_armed
                    && position.get() == 0
                {
                    tracing::info!("encoder at zero, clearing fault");
                    self.invalid_streak = 0;
                    self.transition(LoopMode::Idle);
                    note(&mut actuator_error, self.actuators.de_energize());
                } else {
                    note(&mut actuator_error, self.actuators.heater_off());
                    let speed = self.sensors.read_motor_speed();
                    note(&mut actuator_error, self.actuators.apply_motor(speed));
                }
            }
        }

        self.last_reading = Some(reading);
        self.last_setpoint = setpoint_f;

        let report = TickReport {
            mode: self.mode,
            reading,
            position,
            setpoint_f,
            pid,
            heater: self.actuators.heater_command(),
            motor: self.actuators.motor_command(),
            actuator_error,
        };

        tracing::debug!(
            mode = %report.mode,
            temperature_f = ?reading.value(),
            setpoint_f,
            output = ?pid.map(|p| p.output),
            heater = report.heater.percent(),
            motor = report.motor.percent(),
            "tick"
        );

        report
    }

    fn apply_command(&mut self, cmd: LoopCommand) {
        match (cmd, self.mode) {
            (LoopCommand::Start, LoopMode::Idle) => {
                self.pid.reset(&mut self.pid_state);
                self.invalid_streak = 0;
                self.last_output = 0.0;
                self.transition(LoopMode::Running);
            }
            (LoopCommand::Start, LoopMode::Faulted) => {
                tracing::warn!("start ignored while faulted, reset first");
            }
            (LoopCommand::Stop, LoopMode::Running | LoopMode::Faulted) => {
                self.transition(LoopMode::Idle);
            }
            (LoopCommand::Reset, LoopMode::Faulted) => {
                self.invalid_streak = 0;
                self.transition(LoopMode::Idle);
            }
            (cmd, mode) => {
                tracing::debug!(?cmd, %mode, "command has no effect");
            }
        }
    }

    fn transition(&mut self, to: LoopMode) {
        if self.mode == to {
            return;
        }
        match to {
            LoopMode::Faulted => {
                self.zero_reset_armed = false;
                tracing::warn!(from = %self.mode, "entering faulted mode");
            }
            _ => tracing::info!(from = %self.mode, to = %to, "mode change"),
        }
        self.mode = to;
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    /// Snapshot for diagnostics.
    pub fn state(&self) -> RoasterState {
        RoasterState {
            mode: self.mode,
            temperature_f: self.last_reading.and_then(|r| r.value()),
            last_fault: self.last_fault,
            setpoint_f: self.last_setpoint,
            output: self.last_output,
            heater_duty: self.actuators.heater_command().percent(),
            motor_speed: self.actuators.motor_command().percent(),
            invalid_streak: self.invalid_streak,
            integral: self.pid_state.integral(),
        }
    }

    /// Number of commands waiting for the next tick.
    #[inline]
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Consecutive invalid readings while running.
    #[inline]
    pub fn invalid_streak(&self) -> u8 {
        self.invalid_streak
    }

    /// The PID state.
    #[inline]
    pub fn pid_state(&self) -> &PidState {
        &self.pid_state
    }

    /// The PID controller.
    #[inline]
    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    /// Retunes the controller. The PID state is kept.
    pub fn set_gains(&mut self, gains: PidGains) -> Result<(), ConfigError> {
        self.pid.set_gains(gains)?;
        tracing::info!(kp = gains.kp, ki = gains.ki, kd = gains.kd, "gains updated");
        Ok(())
    }

    /// The sensor adapter.
    #[inline]
    pub fn sensors(&self) -> &SensorAdapter<S, E, P> {
        &self.sensors
    }

    /// Mutable access to the sensor adapter.
    #[inline]
    pub fn sensors_mut(&mut self) -> &mut SensorAdapter<S, E, P> {
        &mut self.sensors
    }

    /// The actuator driver.
    #[inline]
    pub fn actuators(&self) -> &ActuatorDriver<H, M> {
        &self.actuators
    }

    /// Mutable access to the actuator driver.
    #[inline]
    pub fn actuators_mut(&mut self) -> &mut ActuatorDriver<H, M> {
        &mut self.actuators
    }
}

/// Keeps the first error of a tick.
fn note<T>(slot: &mut Option<ActuatorError>, result: Result<T, ActuatorError>) {
    if let Err(err) = result {
        slot.get_or_insert(err);
    }
}
