//! Longitudinal strategies: how a command becomes throttle and brake.
//!
//! Two interchangeable strategies are provided, selected by
//! [`LongitudinalMode`] in the adapter configuration:
//!
//! - **Pedal map** – open loop.  The signed target velocity picks the pedal
//!   (positive → throttle, negative → brake, zero → the sign of the target
//!   acceleration), and the matching calibration table turns the target
//!   acceleration at the current speed into a pedal fraction.
//! - **PID** – closed loop on speed.  The error `|velocity| - speed` drives a
//!   [`PidController`] whose output in `[-1, 1]` is a signed pedal demand.
//!
//! Both release the pedal they are not pressing, so throttle and brake are
//! never applied together.

use serde::{Deserialize, Serialize};
use vpp_calibration::{PedalMap, PedalRemap};
use vpp_hal::{PidConfig, PidController};
use vpp_types::{Command, VppError};

/// Configuration switch between the strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongitudinalMode {
    #[default]
    PedalMap,
    Pid,
}

/// Pedal setpoints in bus units, each in `[0, PERCENT_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pedals {
    pub throttle: i32,
    pub brake: i32,
}

impl Pedals {
    pub const RELEASED: Pedals = Pedals {
        throttle: 0,
        brake: 0,
    };

    pub fn throttle(throttle: i32) -> Self {
        Self { throttle, brake: 0 }
    }

    pub fn brake(brake: i32) -> Self {
        Self { throttle: 0, brake }
    }
}

/// A configured longitudinal strategy.
#[derive(Debug, Clone)]
pub enum LongitudinalStrategy {
    PedalMap {
        accel: PedalMap,
        brake: PedalMap,
        throttle_remap: PedalRemap,
        brake_remap: PedalRemap,
    },
    Pid {
        controller: PidController,
        throttle_remap: PedalRemap,
        brake_remap: PedalRemap,
    },
}

impl LongitudinalStrategy {
    /// Pedal-map strategy with the default bus ranges.
    pub fn pedal_map(accel: PedalMap, brake: PedalMap) -> Self {
        LongitudinalStrategy::PedalMap {
            accel,
            brake,
            throttle_remap: PedalRemap::THROTTLE,
            brake_remap: PedalRemap::BRAKE,
        }
    }

    /// PID strategy with the default bus ranges.
    pub fn pid(config: PidConfig) -> Self {
        LongitudinalStrategy::Pid {
            controller: PidController::with_config(config),
            throttle_remap: PedalRemap::THROTTLE,
            brake_remap: PedalRemap::BRAKE,
        }
    }

    /// Replace the pedal → bus ranges.
    pub fn with_remaps(mut self, throttle: PedalRemap, brake: PedalRemap) -> Self {
        match &mut self {
            LongitudinalStrategy::PedalMap {
                throttle_remap,
                brake_remap,
                ..
            }
            | LongitudinalStrategy::Pid {
                throttle_remap,
                brake_remap,
                ..
            } => {
                *throttle_remap = throttle;
                *brake_remap = brake;
            }
        }
        self
    }

    /// Throttle and brake for `command` at the current `speed` (m/s), `dt`
    /// seconds after the previous call.
    ///
    /// # Errors
    ///
    /// [`VppError::EmptyTable`] when the pedal-map strategy has to consult a
    /// table that holds no data.
    pub fn compute(&mut self, command: &Command, speed: f32, dt: f32) -> Result<Pedals, VppError> {
        match self {
            LongitudinalStrategy::PedalMap {
                accel,
                brake,
                throttle_remap,
                brake_remap,
            } => {
                let direction = if command.velocity != 0.0 {
                    command.velocity
                } else {
                    command.acceleration
                };
                if direction > 0.0 {
                    let pedal = accel.lookup(command.acceleration, speed)?;
                    Ok(Pedals::throttle(throttle_remap.apply(pedal)))
                } else if direction < 0.0 {
                    let pedal = brake.lookup(command.acceleration, speed)?;
                    Ok(Pedals::brake(brake_remap.apply(pedal)))
                } else {
                    Ok(Pedals::RELEASED)
                }
            }
            LongitudinalStrategy::Pid {
                controller,
                throttle_remap,
                brake_remap,
            } => {
                let demand = controller.compute(command.velocity.abs() - speed, dt);
                if demand > 0.0 {
                    Ok(Pedals::throttle(throttle_remap.apply(demand * throttle_remap.from_max)))
                } else if demand < 0.0 {
                    Ok(Pedals::brake(brake_remap.apply(-demand * brake_remap.from_max)))
                } else {
                    Ok(Pedals::RELEASED)
                }
            }
        }
    }

    /// Drop any closed-loop state.  A no-op for the pedal map.
    pub fn reset(&mut self) {
        if let LongitudinalStrategy::Pid { controller, .. } = self {
            controller.reset();
        }
    }
}
