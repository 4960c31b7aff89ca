//! The `VehicleBus` trait – the adapter's only view of the physics engine.
//!
//! Pedal and gear inputs travel as integers on named [`Channel`]s (pedal
//! positions are percent-as-integer in `[0, PERCENT_MAX]`).  Steering is set
//! in degrees on the front wheels.  Rigid-body state is read-only.
//!
//! Implementations are validated once at adapter construction with
//! [`require_channels`]; a bus that lacks a channel the adapter needs is a
//! configuration error, never a per-tick one.

use std::fmt;

use vpp_types::{Quaternion, Vec3, VppError};

/// Full-scale value for percent-as-integer channels (100.00 %).
pub const PERCENT_MAX: i32 = 10_000;

/// Integer channels exposed by the actuator bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Throttle pedal, `[0, PERCENT_MAX]`.
    Throttle,
    /// Brake pedal, `[0, PERCENT_MAX]`.
    Brake,
    /// Requested automatic gear index.
    AutomaticGear,
    /// Light signal (none / left / right / hazard).
    Signal,
    /// Gear actually engaged by the gearbox.  Read-only.
    GearboxMode,
}

impl Channel {
    /// Every channel the actuation adapter touches.
    pub const ALL: [Channel; 5] = [
        Channel::Throttle,
        Channel::Brake,
        Channel::AutomaticGear,
        Channel::Signal,
        Channel::GearboxMode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::Throttle => "throttle",
            Channel::Brake => "brake",
            Channel::AutomaticGear => "automatic_gear",
            Channel::Signal => "signal",
            Channel::GearboxMode => "gearbox_mode",
        }
    }

    /// `false` for channels owned by the physics engine.
    pub fn is_writable(self) -> bool {
        !matches!(self, Channel::GearboxMode)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A physics-layer actuator bus.
///
/// The adapter is the single writer during a tick; the physics engine owns
/// the state reads.  Implementations need not be thread-safe beyond `Send`
/// because the tick step never runs concurrently with itself.
pub trait VehicleBus: Send {
    /// Stable identifier, e.g. `"sim_vehicle"`.
    fn id(&self) -> &str;

    /// `true` when `channel` is wired on this bus.
    fn has_channel(&self, channel: Channel) -> bool;

    /// `true` when the steered wheels are wired on this bus.
    fn has_steering(&self) -> bool;

    /// Read the current value of `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`VppError::MissingChannel`] if the channel is not wired.
    fn read(&self, channel: Channel) -> Result<i32, VppError>;

    /// Write `value` to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`VppError::MissingChannel`] if the channel is not wired, or
    /// [`VppError::Channel`] if it is read-only.
    fn write(&mut self, channel: Channel, value: i32) -> Result<(), VppError>;

    /// Current steer angle of the front wheels in degrees.
    fn steer_angle(&self) -> f32;

    /// Set the steer angle of the front wheels in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`VppError::MissingChannel`] if no steered wheels are wired.
    fn set_steer_angle(&mut self, angle_deg: f32) -> Result<(), VppError>;

    /// Scalar vehicle speed in m/s.
    fn speed(&self) -> f32;

    /// Acceleration in the vehicle's local frame (m/s²).
    fn local_acceleration(&self) -> Vec3;

    /// Rigid-body linear velocity in the world frame (m/s).
    fn velocity(&self) -> Vec3;

    /// Rigid-body angular velocity in the world frame (rad/s).
    fn angular_velocity(&self) -> Vec3;

    /// Orientation of the vehicle body in the world frame.
    fn orientation(&self) -> Quaternion;
}

/// Check that `bus` wires every channel in `required` and its steered wheels.
///
/// # Errors
///
/// Returns the first [`VppError::MissingChannel`] found.
pub fn require_channels(bus: &dyn VehicleBus, required: &[Channel]) -> Result<(), VppError> {
    if !bus.has_steering() {
        return Err(VppError::MissingChannel {
            channel: "steering".to_string(),
        });
    }
    for &channel in required {
        if !bus.has_channel(channel) {
            return Err(VppError::MissingChannel {
                channel: channel.name().to_string(),
            });
        }
    }
    Ok(())
}
