//! [`CommandStore`] – the latest drive-by-wire request, shared between the
//! ingest path and the tick.
//!
//! Every setter applies one inbound message as a single batch, so a tick
//! never sees half of a control message.  Two messages that arrive between
//! ticks are still applied independently: a tick may combine the steer angle
//! of one control message with the gear of a gear message received just
//! before it.  That staleness is accepted.
//!
//! # Example
//!
//! ```rust
//! use vpp_kernel::CommandStore;
//! use vpp_types::Gear;
//!
//! let store = CommandStore::new();
//! let writer = store.clone();
//! writer.set_gear(Gear::Drive);
//!
//! assert_eq!(store.snapshot().gear, Gear::Drive);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vpp_types::{Command, ControlMode, Gear, TurnSignal};

/// Cheaply cloneable handle to the shared [`Command`].
#[derive(Debug, Clone, Default)]
pub struct CommandStore {
    inner: Arc<Mutex<Command>>,
}

impl CommandStore {
    /// A store holding [`Command::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(command: Command) -> Self {
        Self {
            inner: Arc::new(Mutex::new(command)),
        }
    }

    /// Copy of the current command.  Called once at the start of each tick.
    pub fn snapshot(&self) -> Command {
        *self.lock()
    }

    /// Apply `update` as one batch.
    pub fn apply(&self, update: impl FnOnce(&mut Command)) {
        update(&mut *self.lock());
    }

    /// Longitudinal half of a control message.  `None` marks the quantity as
    /// undefined and leaves its last value in place.
    pub fn set_longitudinal(&self, velocity: f32, acceleration: Option<f32>, jerk: Option<f32>) {
        self.apply(|c| {
            c.velocity = velocity;
            c.acceleration_defined = acceleration.is_some();
            if let Some(a) = acceleration {
                c.acceleration = a;
            }
            c.jerk_defined = jerk.is_some();
            if let Some(j) = jerk {
                c.jerk = j;
            }
        });
    }

    /// Lateral half of a control message, in the actuator's degrees.
    pub fn set_steering(&self, angle_deg: f32, rate: Option<f32>) {
        self.apply(|c| {
            c.steer_angle_deg = angle_deg;
            c.steering_rate_defined = rate.is_some();
            if let Some(r) = rate {
                c.steering_rate = r;
            }
        });
    }

    pub fn set_gear(&self, gear: Gear) {
        self.apply(|c| c.gear = gear);
    }

    pub fn set_turn_signal(&self, turn: TurnSignal) {
        self.apply(|c| c.turn_signal = turn);
    }

    pub fn set_hazard(&self, hazard: bool) {
        self.apply(|c| c.hazard = hazard);
    }

    pub fn set_emergency(&self, emergency: bool) {
        self.apply(|c| c.emergency = emergency);
    }

    pub fn set_control_mode(&self, mode: ControlMode) {
        self.apply(|c| c.control_mode = mode);
    }

    // Command is plain data; a poisoned lock still holds a usable value.
    fn lock(&self) -> MutexGuard<'_, Command> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
