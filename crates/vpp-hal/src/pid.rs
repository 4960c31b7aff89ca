//! Generic PID (Proportional–Integral–Derivative) controller.
//!
//! The controller is error-driven: the caller computes `target - measured`
//! and the elapsed time, and receives a clamped corrective output.  It is one
//! of the two interchangeable longitudinal strategies of the actuation
//! adapter, but nothing in it is vehicle specific.
//!
//! # Example
//!
//! ```rust
//! use vpp_hal::pid::{PidConfig, PidController};
//!
//! let mut pid = PidController::with_config(PidConfig {
//!     kp: 1.0,
//!     ki: 0.1,
//!     kd: 0.0,
//!     output_min: -1.0,
//!     output_max: 1.0,
//!     ..PidConfig::default()
//! });
//!
//! let output = pid.compute(0.5, 0.02); // error = 0.5, dt = 20 ms
//! assert!(output > 0.0 && output <= 1.0);
//! ```

use serde::{Deserialize, Serialize};

/// Tuning for a [`PidController`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub output_min: f32,
    pub output_max: f32,
    /// The integral accumulator is clamped to `±integral_limit`.
    pub integral_limit: f32,
    /// Weight in `[0, 1]` given to the newest raw derivative; `1.0` disables
    /// filtering.
    pub derivative_filter: f32,
    /// Errors with a magnitude below this are treated as zero.
    pub deadband: f32,
}

impl Default for PidConfig {
    /// Velocity-tracking tuning: output is a signed pedal demand in `[-1, 1]`.
    fn default() -> Self {
        Self {
            kp: 0.5,
            ki: 0.1,
            kd: 0.05,
            output_min: -1.0,
            output_max: 1.0,
            integral_limit: 10.0,
            derivative_filter: 0.1,
            deadband: 0.0,
        }
    }
}

/// A tunable PID controller with anti-windup, a filtered derivative and an
/// error deadband.
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    integral: f32,
    previous_error: f32,
    filtered_derivative: f32,
}

impl PidController {
    /// Create a controller with the given gains and no output or integral
    /// limits beyond the finite `f32` range.
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self::with_config(PidConfig {
            kp,
            ki,
            kd,
            output_min: f32::MIN,
            output_max: f32::MAX,
            integral_limit: f32::MAX,
            derivative_filter: 0.1,
            deadband: 0.0,
        })
    }

    /// Create a controller from a full configuration.
    ///
    /// Inverted output bounds are swapped, and a non-finite integral limit is
    /// replaced by `f32::MAX`, so [`compute`][Self::compute] can never panic.
    pub fn with_config(mut config: PidConfig) -> Self {
        if config.output_min > config.output_max {
            std::mem::swap(&mut config.output_min, &mut config.output_max);
        }
        config.integral_limit = if config.integral_limit.is_finite() {
            config.integral_limit.abs()
        } else {
            f32::MAX
        };
        config.derivative_filter = if config.derivative_filter.is_finite() {
            config.derivative_filter.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            config,
            integral: 0.0,
            previous_error: 0.0,
            filtered_derivative: 0.0,
        }
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Update the proportional, integral, and derivative gains.
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32) {
        self.config.kp = kp;
        self.config.ki = ki;
        self.config.kd = kd;
    }

    /// Compute the next controller output for `error` after `dt` seconds.
    ///
    /// The deadband zeroes the error before all three terms, and the zeroed
    /// value is what the next derivative step sees as the previous error.
    /// When `dt` is not a positive finite number the integral is left
    /// untouched and the derivative term is zero.
    pub fn compute(&mut self, error: f32, dt: f32) -> f32 {
        let cfg = self.config;
        let error = if error.abs() < cfg.deadband { 0.0 } else { error };
        let dt_valid = dt.is_finite() && dt > 0.0;

        let derivative = if dt_valid {
            self.integral =
                (self.integral + error * dt).clamp(-cfg.integral_limit, cfg.integral_limit);

            let raw = (self.previous_error - error) / dt;
            self.filtered_derivative += cfg.derivative_filter * (raw - self.filtered_derivative);
            self.filtered_derivative
        } else {
            0.0
        };
        self.previous_error = error;

        let output = cfg.kp * error + cfg.ki * self.integral + cfg.kd * derivative;
        if output.is_nan() {
            return 0.0_f32.clamp(cfg.output_min, cfg.output_max);
        }
        output.clamp(cfg.output_min, cfg.output_max)
    }

    /// Zero the integral accumulator and derivative memory.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.filtered_derivative = 0.0;
    }
}
