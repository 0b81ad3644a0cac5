//! PID controller with integral anti-windup.
//!
//! The controller itself holds only configuration (gains and output
//! range). All mutable state lives in a separate [`PidState`] owned by the
//! caller, so the loop decides when it gets reset.
//!
//! # Algorithm
//!
//! ```text
//! error      = setpoint - measured
//! integral  += error * dt            (contribution clamped to the output range)
//! derivative = (error - previous_error) / dt   (0 when dt is ~0)
//! output     = clamp(kp*error + ki*integral + kd*derivative, min, max)
//! ```
//!
//! # Example
//!
//! ```rust
//! use rs_roaster::pid::{PidController, PidGains, PidState};
//!
//! let pid = PidController::new(PidGains::new(35.0, 1.0, 0.0), 0.0, 100.0).unwrap();
//! let mut state = PidState::new();
//!
//! let out = pid.compute(400.0, 300.0, 1.0, &mut state);
//! assert_eq!(out.unclamped, 3600.0);
//! assert_eq!(out.output, 100.0);
//! ```

use crate::clamp::clamp;
use crate::config::PidConfig;
use crate::error::ConfigError;

/// Below this `dt` (seconds) the derivative term is treated as 0.
pub const DT_EPSILON: f32 = 1e-6;

/// Proportional, integral and derivative gains.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidGains {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain (per second).
    pub ki: f32,
    /// Derivative gain (seconds).
    pub kd: f32,
}

impl PidGains {
    /// Creates a gain set.
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }

    /// Gains must be finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidGain { name, value });
            }
        }
        Ok(())
    }
}

impl Default for PidGains {
    /// Roast profile gains: kp 35, ki 1, kd 0.
    fn default() -> Self {
        Self::new(35.0, 1.0, 0.0)
    }
}

/// Mutable controller state.
///
/// Only [`PidController::compute`] and [`PidController::reset`] change it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidState {
    integral: f32,
    previous_error: f32,
    last_ms: Option<u64>,
}

impl PidState {
    /// Zeroed state.
    pub const fn new() -> Self {
        Self {
            integral: 0.0,
            previous_error: 0.0,
            last_ms: None,
        }
    }

    /// Accumulated integral (error x seconds).
    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Error from the previous sample.
    #[inline]
    pub fn previous_error(&self) -> f32 {
        self.previous_error
    }

    /// Timestamp of the previous sample, if any.
    #[inline]
    pub fn last_ms(&self) -> Option<u64> {
        self.last_ms
    }
}

/// Result of one controller step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidOutput {
    /// Error used for this step.
    pub error: f32,
    /// `kp * error`
    pub proportional: f32,
    /// `ki * integral`, already bounded to the output range.
    pub integral: f32,
    /// `kd * derivative`
    pub derivative: f32,
    /// Sum of the three terms before clamping.
    pub unclamped: f32,
    /// Final output, within `[output_min, output_max]`.
    pub output: f32,
}

/// PID controller configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct PidController {
    gains: PidGains,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    /// Creates a controller with validated gains and output range.
    pub fn new(gains: PidGains, output_min: f32, output_max: f32) -> Result<Self, ConfigError> {
        let config = PidConfig {
            gains,
            output_min,
            output_max,
        };
        Self::from_config(&config)
    }

    /// Creates a controller from its configuration section.
    pub fn from_config(config: &PidConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gains: config.gains,
            output_min: config.output_min,
            output_max: config.output_max,
        })
    }

    /// Current gains.
    #[inline]
    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Output range as `(min, max)`.
    #[inline]
    pub fn output_range(&self) -> (f32, f32) {
        (self.output_min, self.output_max)
    }

    /// Replaces the gains at runtime.
    ///
    /// The integral accumulator is kept; call [`reset`](Self::reset) as well
    /// if the new gains differ a lot.
    pub fn set_gains(&mut self, gains: PidGains) -> Result<(), ConfigError> {
        gains.validate()?;
        self.gains = gains;
        Ok(())
    }

    /// Zeroes integral, previous error and timestamp.
    pub fn reset(&self, state: &mut PidState) {
        *state = PidState::new();
    }

    /// Runs one step with an explicit `dt` in seconds.
    ///
    /// Negative or NaN `dt` is treated as 0.
    pub fn compute(&self, setpoint: f32, measured: f32, dt: f32, state: &mut PidState) -> PidOutput {
        let dt = if dt > 0.0 { dt } else { 0.0 };
        let PidGains { kp, ki, kd } = self.gains;

        let error = setpoint - measured;
        let proportional = kp * error;

        // Anti-windup: bound the contribution, then back-calculate the
        // accumulator so it never runs past what the actuator can use.
        state.integral += error * dt;
        let integral = if ki > 0.0 {
            let bounded = clamp(ki * state.integral, self.output_min, self.output_max);
            state.integral = bounded / ki;
            bounded
        } else {
            state.integral = clamp(state.integral, self.output_min, self.output_max);
            0.0
        };

        let derivative = if dt > DT_EPSILON {
            kd * (error - state.previous_error) / dt
        } else {
            0.0
        };
        state.previous_error = error;

        let unclamped = proportional + integral + derivative;
        PidOutput {
            error,
            proportional,
            integral,
            derivative,
            unclamped,
            output: clamp(unclamped, self.output_min, self.output_max),
        }
    }

    /// Runs one step, deriving `dt` from the timestamp kept in `state`.
    ///
    /// The first sample after a reset has `dt = 0`.
    pub fn compute_at(
        &self,
        setpoint: f32,
        measured: f32,
        now_ms: u64,
        state: &mut PidState,
    ) -> PidOutput {
        let dt = match state.last_ms {
            Some(prev) => now_ms.saturating_sub(prev) as f32 / 1000.0,
            None => 0.0,
        };
        state.last_ms = Some(now_ms);
        self.compute(setpoint, measured, dt, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(kp: f32, ki: f32, kd: f32) -> PidController {
        PidController::new(PidGains::new(kp, ki, kd), 0.0, 100.0).unwrap()
    }

    #[test]
    fn first_tick_arithmetic_before_clamping() {
        let pid = controller(35.0, 1.0, 0.0);
        let mut state = PidState::new();

        let out = pid.compute(400.0, 300.0, 1.0, &mut state);

        assert_eq!(out.error, 100.0);
        assert_eq!(out.proportional, 3500.0);
        assert_eq!(out.integral, 100.0);
        assert_eq!(out.derivative, 0.0);
        assert_eq!(out.unclamped, 3600.0);
        assert_eq!(out.output, 100.0);
    }

    #[test]
    fn zero_error_steady_state() {
        let pid = controller(35.0, 0.0, 0.0);
        for dt in [0.001, 0.25, 0.5, 1.0, 10.0] {
            let mut state = PidState::new();
            for _ in 0..100 {
                let out = pid.compute(350.0, 350.0, dt, &mut state);
                assert_eq!(out.output, 0.0);
            }
        }
    }

    #[test]
    fn integral_contribution_bounded() {
        let pid = controller(35.0, 1.0, 0.0);
        let mut state = PidState::new();

        for _ in 0..10_000 {
            let out = pid.compute(500.0, 400.0, 1.0, &mut state);
            assert!(out.integral >= 0.0 && out.integral <= 100.0);
        }
        assert!(state.integral() <= 100.0);
    }

    #[test]
    fn integral_recovers_quickly_after_saturation() {
        let pid = controller(1.0, 1.0, 0.0);
        let mut state = PidState::new();

        for _ in 0..1000 {
            pid.compute(500.0, 400.0, 1.0, &mut state);
        }
        // Overshoot: a bounded integral unwinds within a few steps
        let mut steps = 0;
        while state.integral() > 0.0 && steps < 100 {
            pid.compute(400.0, 450.0, 1.0, &mut state);
            steps += 1;
        }
        assert!(steps <= 2, "took {} steps to unwind", steps);
    }

    #[test]
    fn integral_held_in_range_with_zero_ki() {
        let pid = controller(1.0, 0.0, 0.0);
        let mut state = PidState::new();
        for _ in 0..1000 {
            let out = pid.compute(500.0, 0.0, 1.0, &mut state);
            assert_eq!(out.integral, 0.0);
        }
        assert_eq!(state.integral(), 100.0);
    }

    #[test]
    fn negative_error_clamps_to_min() {
        let pid = controller(35.0, 1.0, 0.0);
        let mut state = PidState::new();
        let out = pid.compute(200.0, 300.0, 1.0, &mut state);
        assert_eq!(out.unclamped, -3500.0);
        assert_eq!(out.output, 0.0);
        assert_eq!(state.integral(), 0.0);
    }

    #[test]
    fn derivative_term() {
        let pid = controller(0.0, 0.0, 2.0);
        let mut state = PidState::new();

        pid.compute(300.0, 290.0, 1.0, &mut state); // error 10
        let out = pid.compute(300.0, 280.0, 0.5, &mut state); // error 20

        assert_eq!(out.derivative, 2.0 * (20.0 - 10.0) / 0.5);
        assert_eq!(out.output, 40.0);
    }

    #[test]
    fn derivative_zero_when_dt_zero() {
        let pid = controller(0.0, 0.0, 5.0);
        let mut state = PidState::new();

        pid.compute(300.0, 290.0, 1.0, &mut state);
        let out = pid.compute(300.0, 200.0, 0.0, &mut state);
        assert_eq!(out.derivative, 0.0);
        assert!(out.output.is_finite());

        let out = pid.compute(300.0, 200.0, 1e-9, &mut state);
        assert_eq!(out.derivative, 0.0);
    }

    #[test]
    fn negative_and_nan_dt_treated_as_zero() {
        let pid = controller(1.0, 1.0, 1.0);
        let mut state = PidState::new();

        let out = pid.compute(110.0, 100.0, -5.0, &mut state);
        assert_eq!(out.integral, 0.0);
        assert_eq!(out.derivative, 0.0);

        let out = pid.compute(110.0, 100.0, f32::NAN, &mut state);
        assert_eq!(out.integral, 0.0);
        assert_eq!(out.output, 10.0);
    }

    #[test]
    fn reset_zeroes_state() {
        let pid = controller(35.0, 1.0, 0.0);
        let mut state = PidState::new();
        pid.compute_at(400.0, 390.0, 0, &mut state);
        pid.compute_at(400.0, 390.0, 1000, &mut state);
        assert!(state.integral() > 0.0);
        assert_eq!(state.last_ms(), Some(1000));

        pid.reset(&mut state);
        assert_eq!(state, PidState::new());
    }

    #[test]
    fn compute_at_derives_dt() {
        let pid = controller(0.0, 1.0, 0.0);
        let mut state = PidState::new();

        // First sample: dt = 0, nothing integrated
        let out = pid.compute_at(310.0, 300.0, 5_000, &mut state);
        assert_eq!(out.integral, 0.0);

        // 500 ms later: 10 °F x 0.5 s
        let out = pid.compute_at(310.0, 300.0, 5_500, &mut state);
        assert_eq!(out.integral, 5.0);
    }

    #[test]
    fn compute_at_clock_going_backwards() {
        let pid = controller(0.0, 1.0, 0.0);
        let mut state = PidState::new();
        pid.compute_at(310.0, 300.0, 5_000, &mut state);
        let out = pid.compute_at(310.0, 300.0, 4_000, &mut state);
        assert_eq!(out.integral, 0.0);
    }

    #[test]
    fn set_gains_validates() {
        let mut pid = controller(35.0, 1.0, 0.0);
        assert!(pid.set_gains(PidGains::new(20.0, 0.5, 1.0)).is_ok());
        assert_eq!(pid.gains(), PidGains::new(20.0, 0.5, 1.0));

        let err = pid.set_gains(PidGains::new(f32::INFINITY, 0.0, 0.0));
        assert!(matches!(err, Err(ConfigError::InvalidGain { name: "kp", .. })));
        assert_eq!(pid.gains(), PidGains::new(20.0, 0.5, 1.0));
    }

    #[test]
    fn new_rejects_inverted_range() {
        let err = PidController::new(PidGains::default(), 100.0, 0.0);
        assert!(matches!(err, Err(ConfigError::InvertedBounds { .. })));
    }

    #[test]
    fn default_gains() {
        assert_eq!(PidGains::default(), PidGains::new(35.0, 1.0, 0.0));
        assert!(PidGains::default().validate().is_ok());
    }
}
