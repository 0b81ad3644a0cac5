//! Actuator driver: heater and drum motor with safety limits.
//!
//! [`ActuatorDriver`] turns the PID output into a heater drive signal and a
//! desired drum speed into a motor command:
//!
//! - Heater duty is clamped to `[0, max_safe_duty]`, then written either
//!   directly ([`HeaterMode::Pwm`]) or as on/off switching within a fixed
//!   window ([`HeaterMode::TimeProportional`]) for solid-state relays.
//!   A level written on a tick holds until the next one, so the relay is
//!   only switched on for a tick whose whole period fits in the remaining
//!   on-time of the window. Unused on-time shorter than a tick carries into
//!   the next window, keeping the average at the commanded duty.
//!
//!   ```text
//!   85 %, 2000 ms window, 500 ms tick
//!   window   1      2      3      4      5
//!   budget  1700   1900   2100   1800   2000
//!   ticks   ###.   ###.   ####   ###.   ####   -> 17 of 20 on
//!   ```
//! - Drum speed is clamped to `[motor_min, motor_max]` while roasting.
//!
//! A rejected write is logged, the heater is forced off, and an
//! [`ActuatorError`] is returned.
//!
//! # Example
//!
//! ```rust
//! use rs_roaster::actuator::ActuatorDriver;
//! use rs_roaster::config::{ActuatorConfig, HeaterMode};
//! use rs_roaster::hal::{MockHeater, MockMotor};
//!
//! let config = ActuatorConfig::default().with_heater_mode(HeaterMode::Pwm);
//! let mut actuators = ActuatorDriver::new(MockHeater::new(), MockMotor::new(), config, 500);
//!
//! // PID asks for 100%, the safety ceiling is 85%
//! let cmd = actuators.apply_heater(100.0, 0).unwrap();
//! assert_eq!(cmd.percent(), 85);
//! assert_eq!(actuators.heater().duty, 85);
//! ```

use core::fmt::Debug;

use crate::clamp::clamp;
use crate::config::{ActuatorConfig, HeaterMode};
use crate::error::ActuatorError;
use crate::traits::{DrumMotor, HeaterOutput};

/// Heater duty in percent, `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaterCommand(u8);

impl HeaterCommand {
    /// Heater off.
    pub const OFF: Self = Self(0);

    /// Creates a command, capping at 100.
    #[inline]
    pub fn new(percent: u8) -> Self {
        Self(clamp(percent, 0, 100))
    }

    /// Duty in percent.
    #[inline]
    pub const fn percent(&self) -> u8 {
        self.0
    }
}

/// Drum speed in percent, `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorCommand(u8);

impl MotorCommand {
    /// Motor stopped.
    pub const STOPPED: Self = Self(0);

    /// Creates a command, capping at 100.
    #[inline]
    pub fn new(percent: u8) -> Self {
        Self(clamp(percent, 0, 100))
    }

    /// Speed in percent.
    #[inline]
    pub const fn percent(&self) -> u8 {
        self.0
    }
}

/// Drives the heater and drum motor.
///
/// # Type Parameters
///
/// - `H`: heater output ([`HeaterOutput`])
/// - `M`: drum motor ([`DrumMotor`])
pub struct ActuatorDriver<H, M> {
    heater: H,
    motor: M,
    config: ActuatorConfig,
    /// Period a written level is held for
    tick_ms: u32,
    window: Option<SwitchWindow>,
    /// Last duty written to the heater output (0/100 when time-proportioned)
    heater_level: u8,
    heater_command: HeaterCommand,
    motor_command: MotorCommand,
}

/// On-time bookkeeping for one time-proportioning window.
#[derive(Clone, Copy, Debug)]
struct SwitchWindow {
    start_ms: u64,
    /// Unused on-time brought over from the previous window
    carry_ms: u64,
    /// On-time granted this window, including carry
    allowance_ms: u64,
    /// On-time already spent this window
    used_ms: u64,
}

impl<H, M> ActuatorDriver<H, M>
where
    H: HeaterOutput,
    H::Error: Debug,
    M: DrumMotor,
    M::Error: Debug,
{
    /// Creates a driver for a caller that applies commands every `tick_ms`.
    /// Outputs are not touched until the first command.
    pub fn new(heater: H, motor: M, config: ActuatorConfig, tick_ms: u32) -> Self {
        Self {
            heater,
            motor,
            config,
            tick_ms,
            window: None,
            heater_level: 0,
            heater_command: HeaterCommand::OFF,
            motor_command: MotorCommand::STOPPED,
        }
    }

    /// Maps a controller output to a heater duty and drives the heater.
    ///
    /// Returns the commanded duty (the window average when
    /// time-proportioned).
    pub fn apply_heater(
        &mut self,
        control_output: f32,
        now_ms: u64,
    ) -> Result<HeaterCommand, ActuatorError> {
        let duty = clamp(control_output, 0.0, self.config.max_safe_duty as f32);
        let command = HeaterCommand::new((duty + 0.5) as u8);

        let level = match self.config.heater_mode {
            HeaterMode::Pwm => command.percent(),
            HeaterMode::TimeProportional { window_ms } => {
                self.time_proportioned(command.percent(), window_ms, now_ms)
            }
        };

        if let Err(err) = self.heater.set_duty(level) {
            tracing::warn!(?err, level, "heater write failed, forcing off");
            self.force_heater_off();
            return Err(ActuatorError::Heater);
        }
        tracing::trace!(duty = command.percent(), level, "heater");

        self.heater_level = level;
        self.heater_command = command;
        Ok(command)
    }

    /// Drives the drum motor, clamped to the safe roasting range.
    pub fn apply_motor(&mut self, desired_speed: u8) -> Result<MotorCommand, ActuatorError> {
        let command = MotorCommand::new(clamp(
            desired_speed,
            self.config.motor_min,
            self.config.motor_max,
        ));

        if let Err(err) = self.motor.set_speed(command.percent()) {
            tracing::warn!(?err, speed = command.percent(), "motor write failed");
            return Err(ActuatorError::Motor);
        }

        self.motor_command = command;
        Ok(command)
    }

    /// De-energizes the heater and restarts the switching window.
    pub fn heater_off(&mut self) -> Result<(), ActuatorError> {
        self.window = None;
        self.heater_command = HeaterCommand::OFF;
        match self.heater.off() {
            Ok(()) => {
                self.heater_level = 0;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(?err, "heater off failed");
                Err(ActuatorError::Heater)
            }
        }
    }

    /// Stops the drum motor.
    pub fn motor_off(&mut self) -> Result<(), ActuatorError> {
        match self.motor.stop() {
            Ok(()) => {
                self.motor_command = MotorCommand::STOPPED;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(?err, "motor stop failed");
                Err(ActuatorError::Motor)
            }
        }
    }

    /// Heater off and motor stopped. Both are attempted; the first error wins.
    pub fn de_energize(&mut self) -> Result<(), ActuatorError> {
        let heater = self.heater_off();
        let motor = self.motor_off();
        heater.and(motor)
    }

    fn force_heater_off(&mut self) {
        self.window = None;
        self.heater_command = HeaterCommand::OFF;
        if self.heater.off().is_ok() {
            self.heater_level = 0;
        }
    }

    /// On while the window's remaining on-time covers a full tick.
    ///
    /// Over any run of whole windows the on-time never exceeds `duty`% of
    /// the elapsed time.
    fn time_proportioned(&mut self, duty: u8, window_ms: u32, now_ms: u64) -> u8 {
        let window = window_ms.max(1) as u64;
        let tick = self.tick_ms.max(1) as u64;
        let mut current = self.window.unwrap_or(SwitchWindow {
            start_ms: now_ms,
            carry_ms: 0,
            allowance_ms: 0,
            used_ms: 0,
        });

        let elapsed = now_ms.saturating_sub(current.start_ms);
        if elapsed >= window {
            // Leftover below one tick survives a single rollover only
            current.carry_ms = if elapsed < 2 * window {
                let unused = current.allowance_ms.saturating_sub(current.used_ms);
                unused.min(tick - 1)
            } else {
                0
            };
            current.start_ms += elapsed / window * window;
            current.used_ms = 0;
        }

        current.allowance_ms = duty as u64 * window / 100 + current.carry_ms;
        let level = if current.used_ms + tick <= current.allowance_ms {
            current.used_ms += tick;
            100
        } else {
            0
        };
        self.window = Some(current);
        level
    }

    /// Last commanded heater duty.
    #[inline]
    pub fn heater_command(&self) -> HeaterCommand {
        self.heater_command
    }

    /// Last level written to the heater output.
    #[inline]
    pub fn heater_level(&self) -> u8 {
        self.heater_level
    }

    /// Last commanded drum speed.
    #[inline]
    pub fn motor_command(&self) -> MotorCommand {
        self.motor_command
    }

    /// The actuator configuration.
    #[inline]
    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    /// The heater driver.
    #[inline]
    pub fn heater(&self) -> &H {
        &self.heater
    }

    /// Mutable access to the heater driver.
    #[inline]
    pub fn heater_mut(&mut self) -> &mut H {
        &mut self.heater
    }

    /// The motor driver.
    #[inline]
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// Mutable access to the motor driver.
    #[inline]
    pub fn motor_mut(&mut self) -> &mut M {
        &mut self.motor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockHeater, MockMotor};

    fn pwm_driver() -> ActuatorDriver<MockHeater, MockMotor> {
        let config = ActuatorConfig::default().with_heater_mode(HeaterMode::Pwm);
        ActuatorDriver::new(MockHeater::new(), MockMotor::new(), config, 500)
    }

    fn windowed_driver(window_ms: u32, tick_ms: u32) -> ActuatorDriver<MockHeater, MockMotor> {
        let config = ActuatorConfig::default()
            .with_max_safe_duty(100)
            .with_heater_mode(HeaterMode::TimeProportional { window_ms });
        ActuatorDriver::new(MockHeater::new(), MockMotor::new(), config, tick_ms)
    }

    /// Counts the ticks switched on over `ticks` calls at a fixed cadence.
    fn on_ticks(
        driver: &mut ActuatorDriver<MockHeater, MockMotor>,
        duty: f32,
        ticks: u64,
        tick_ms: u64,
    ) -> u64 {
        (0..ticks)
            .filter(|n| {
                driver.apply_heater(duty, n * tick_ms).unwrap();
                driver.heater_level() == 100
            })
            .count() as u64
    }

    // =========================================================================
    // Command Types
    // =========================================================================

    #[test]
    fn commands_cap_at_100() {
        assert_eq!(HeaterCommand::new(150).percent(), 100);
        assert_eq!(MotorCommand::new(255).percent(), 100);
        assert_eq!(HeaterCommand::default(), HeaterCommand::OFF);
        assert_eq!(MotorCommand::default(), MotorCommand::STOPPED);
    }

    // =========================================================================
    // PWM Heater
    // =========================================================================

    #[test]
    fn pwm_heater_respects_safety_ceiling() {
        let mut driver = pwm_driver();
        assert_eq!(driver.apply_heater(3600.0, 0).unwrap().percent(), 85);
        assert_eq!(driver.heater().duty, 85);
    }

    #[test]
    fn pwm_heater_clamps_negative_and_nan() {
        let mut driver = pwm_driver();
        assert_eq!(driver.apply_heater(-20.0, 0).unwrap(), HeaterCommand::OFF);
        assert_eq!(driver.apply_heater(f32::NAN, 0).unwrap(), HeaterCommand::OFF);
        assert_eq!(driver.heater().duty, 0);
    }

    #[test]
    fn pwm_heater_rounds() {
        let mut driver = pwm_driver();
        assert_eq!(driver.apply_heater(42.4, 0).unwrap().percent(), 42);
        assert_eq!(driver.apply_heater(42.6, 0).unwrap().percent(), 43);
    }

    #[test]
    fn max_safe_duty_zero_disables_heater() {
        let config = ActuatorConfig::default()
            .with_heater_mode(HeaterMode::Pwm)
            .with_max_safe_duty(0);
        let mut driver = ActuatorDriver::new(MockHeater::new(), MockMotor::new(), config, 500);
        assert_eq!(driver.apply_heater(100.0, 0).unwrap(), HeaterCommand::OFF);
    }

    // =========================================================================
    // Time-Proportioned Heater
    // =========================================================================

    #[test]
    fn time_proportioned_half_duty() {
        let mut driver = windowed_driver(2000, 500);
        let levels: Vec<u8> = (0..8u64)
            .map(|n| {
                driver.apply_heater(50.0, n * 500).unwrap();
                driver.heater_level()
            })
            .collect();
        assert_eq!(levels, vec![100, 100, 0, 0, 100, 100, 0, 0]);
        assert_eq!(driver.heater_command().percent(), 50);
    }

    #[test]
    fn partial_tick_never_switches_on() {
        // 85% of 2000 ms leaves 200 ms after three ticks, less than a tick
        let mut driver = windowed_driver(2000, 500);
        let levels: Vec<u8> = (0..4u64)
            .map(|n| {
                driver.apply_heater(85.0, n * 500).unwrap();
                driver.heater_level()
            })
            .collect();
        assert_eq!(levels, vec![100, 100, 100, 0]);
    }

    #[test]
    fn leftover_on_time_carries_forward() {
        let mut driver = windowed_driver(2000, 500);
        let per_window: Vec<u64> = (0..5u64)
            .map(|w| {
                (0..4u64)
                    .filter(|n| {
                        driver.apply_heater(85.0, w * 2000 + n * 500).unwrap();
                        driver.heater_level() == 100
                    })
                    .count() as u64
            })
            .collect();
        assert_eq!(per_window, vec![3, 3, 4, 3, 4]);
    }

    #[test]
    fn effective_duty_never_exceeds_command() {
        for duty in [10u8, 25, 30, 50, 60, 75, 80, 85, 90, 99] {
            let mut driver = windowed_driver(2000, 500);
            let ticks = 400;
            let on = on_ticks(&mut driver, duty as f32, ticks, 500);
            let allowed = ticks * duty as u64 / 100;
            assert!(on <= allowed, "duty {duty}: {on} of {ticks} ticks on");
            // Within one window's worth of rounding
            assert!(allowed - on <= 4, "duty {duty}: {on} of {ticks} ticks on");
        }
    }

    #[test]
    fn time_proportioned_zero_and_full() {
        let mut driver = windowed_driver(1000, 250);
        for t in (0..3000).step_by(250) {
            driver.apply_heater(0.0, t).unwrap();
            assert_eq!(driver.heater().duty, 0);
        }

        let mut driver = windowed_driver(1000, 250);
        for t in (0..3000).step_by(250) {
            driver.apply_heater(100.0, t).unwrap();
            assert_eq!(driver.heater().duty, 100);
        }
    }

    #[test]
    fn time_proportioned_skips_missed_windows() {
        let mut driver = windowed_driver(1000, 250);
        driver.apply_heater(30.0, 0).unwrap();
        // Long gap: lands in a later window with no carry
        driver.apply_heater(30.0, 7_000).unwrap();
        assert_eq!(driver.heater_level(), 100);
        driver.apply_heater(30.0, 7_250).unwrap();
        assert_eq!(driver.heater_level(), 0);
    }

    #[test]
    fn heater_off_restarts_window() {
        let mut driver = windowed_driver(1000, 250);
        driver.apply_heater(50.0, 0).unwrap();
        driver.apply_heater(50.0, 250).unwrap();
        driver.apply_heater(50.0, 500).unwrap();
        assert_eq!(driver.heater_level(), 0);

        driver.heater_off().unwrap();
        driver.apply_heater(50.0, 750).unwrap();
        assert_eq!(driver.heater_level(), 100);
    }

    // =========================================================================
    // Motor
    // =========================================================================

    #[test]
    fn motor_clamped_to_safe_range() {
        let mut driver = pwm_driver();
        assert_eq!(driver.apply_motor(0).unwrap().percent(), 30);
        assert_eq!(driver.apply_motor(55).unwrap().percent(), 55);
        assert_eq!(driver.apply_motor(200).unwrap().percent(), 100);
        assert_eq!(driver.motor().speed, 100);
    }

    #[test]
    fn motor_off_bypasses_minimum() {
        let mut driver = pwm_driver();
        driver.apply_motor(60).unwrap();
        driver.motor_off().unwrap();
        assert_eq!(driver.motor().speed, 0);
        assert_eq!(driver.motor_command(), MotorCommand::STOPPED);
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[test]
    fn heater_write_failure_forces_off() {
        let mut driver = pwm_driver();
        driver.apply_heater(60.0, 0).unwrap();

        driver.heater_mut().fail_next = true;
        assert_eq!(driver.apply_heater(70.0, 500), Err(ActuatorError::Heater));
        assert_eq!(driver.heater().duty, 0);
        assert_eq!(driver.heater_command(), HeaterCommand::OFF);
    }

    #[test]
    fn motor_write_failure_reported() {
        let mut driver = pwm_driver();
        driver.motor_mut().fail = true;
        assert_eq!(driver.apply_motor(60), Err(ActuatorError::Motor));
        assert_eq!(driver.motor_command(), MotorCommand::STOPPED);
    }

    #[test]
    fn de_energize_attempts_both() {
        let mut driver = pwm_driver();
        driver.apply_heater(60.0, 0).unwrap();
        driver.apply_motor(60).unwrap();

        driver.heater_mut().fail = true;
        assert_eq!(driver.de_energize(), Err(ActuatorError::Heater));
        assert_eq!(driver.motor().speed, 0);
    }
}
