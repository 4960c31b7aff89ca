//! In-process simulated actuator bus for tests and headless runs.
//!
//! [`SimVehicle`] records every channel write and returns whatever
//! rigid-body state the test has placed on it.  It models no dynamics: the
//! only physics it imitates is the gearbox engaging the requested gear
//! immediately.
//!
//! # Example
//!
//! ```rust
//! use vpp_hal::bus::{Channel, VehicleBus};
//! use vpp_hal::sim::SimVehicle;
//!
//! let mut bus = SimVehicle::builder()
//!     .with_all_channels()
//!     .with_steering()
//!     .build();
//!
//! bus.write(Channel::Throttle, 2500).expect("sim write must succeed");
//! assert_eq!(bus.read(Channel::Throttle).unwrap(), 2500);
//! ```

use std::collections::HashMap;

use tracing::trace;
use vpp_types::{Quaternion, Vec3, VppError};

use crate::bus::{Channel, VehicleBus};

// ────────────────────────────────────────────────────────────────────────────
// SimVehicle
// ────────────────────────────────────────────────────────────────────────────

/// A simulated actuator bus.  Writes always succeed on wired channels.
#[derive(Debug, Clone)]
pub struct SimVehicle {
    id: String,
    channels: HashMap<Channel, i32>,
    writes: HashMap<Channel, usize>,
    steering: bool,
    steer_angle: f32,
    speed: f32,
    local_acceleration: Vec3,
    velocity: Vec3,
    angular_velocity: Vec3,
    orientation: Quaternion,
}

impl SimVehicle {
    /// Start building a simulated bus with no channels wired.
    pub fn builder() -> SimVehicleBuilder {
        SimVehicleBuilder::default()
    }

    /// Number of writes `channel` has received since construction.
    pub fn write_count(&self, channel: Channel) -> usize {
        self.writes.get(&channel).copied().unwrap_or(0)
    }

    /// Place the vehicle in motion along its heading at `speed` m/s.
    pub fn set_forward_speed(&mut self, speed: f32) {
        self.speed = speed.abs();
        self.velocity = self.orientation.rotate(Vec3::new(speed, 0.0, 0.0));
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.angular_velocity = angular_velocity;
    }

    pub fn set_local_acceleration(&mut self, acceleration: Vec3) {
        self.local_acceleration = acceleration;
    }

    pub fn set_orientation(&mut self, orientation: Quaternion) {
        self.orientation = orientation;
    }

    fn missing(channel: Channel) -> VppError {
        VppError::MissingChannel {
            channel: channel.name().to_string(),
        }
    }
}

impl VehicleBus for SimVehicle {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_channel(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    fn has_steering(&self) -> bool {
        self.steering
    }

    fn read(&self, channel: Channel) -> Result<i32, VppError> {
        self.channels
            .get(&channel)
            .copied()
            .ok_or_else(|| Self::missing(channel))
    }

    fn write(&mut self, channel: Channel, value: i32) -> Result<(), VppError> {
        if !channel.is_writable() {
            return Err(VppError::Channel(format!("channel '{channel}' is read-only")));
        }
        let slot = self
            .channels
            .get_mut(&channel)
            .ok_or_else(|| Self::missing(channel))?;
        *slot = value;
        *self.writes.entry(channel).or_insert(0) += 1;
        trace!(bus = %self.id, %channel, value, "Sim write");

        if channel == Channel::AutomaticGear {
            if let Some(mode) = self.channels.get_mut(&Channel::GearboxMode) {
                *mode = value;
            }
        }
        Ok(())
    }

    fn steer_angle(&self) -> f32 {
        self.steer_angle
    }

    fn set_steer_angle(&mut self, angle_deg: f32) -> Result<(), VppError> {
        if !self.steering {
            return Err(VppError::MissingChannel {
                channel: "steering".to_string(),
            });
        }
        self.steer_angle = angle_deg;
        Ok(())
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn local_acceleration(&self) -> Vec3 {
        self.local_acceleration
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn orientation(&self) -> Quaternion {
        self.orientation
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder for [`SimVehicle`].  Call the `with_*` methods for the channels a
/// test needs, then [`build`][Self::build].
#[derive(Debug, Default)]
pub struct SimVehicleBuilder {
    id: Option<String>,
    channels: Vec<Channel>,
    steering: bool,
}

impl SimVehicleBuilder {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Wire a single channel, initialised to zero.
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channels.push(channel);
        self
    }

    /// Wire every channel in [`Channel::ALL`].
    pub fn with_all_channels(mut self) -> Self {
        self.channels.extend(Channel::ALL);
        self
    }

    /// Wire the steered front wheels.
    pub fn with_steering(mut self) -> Self {
        self.steering = true;
        self
    }

    pub fn build(self) -> SimVehicle {
        SimVehicle {
            id: self.id.unwrap_or_else(|| "sim_vehicle".to_string()),
            channels: self.channels.into_iter().map(|c| (c, 0)).collect(),
            writes: HashMap::new(),
            steering: self.steering,
            steer_angle: 0.0,
            speed: 0.0,
            local_acceleration: Vec3::zero(),
            velocity: Vec3::zero(),
            angular_velocity: Vec3::zero(),
            orientation: Quaternion::identity(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::require_channels;

    #[test]
    fn full_sim_passes_channel_validation() {
        let bus = SimVehicle::builder().with_all_channels().with_steering().build();
        require_channels(&bus, &Channel::ALL).expect("full sim must validate");
    }

    #[test]
    fn unwired_channel_is_reported() {
        let bus = SimVehicle::builder()
            .with_channel(Channel::Throttle)
            .with_steering()
            .build();
        let err = require_channels(&bus, &Channel::ALL).unwrap_err();
        assert!(matches!(err, VppError::MissingChannel { channel } if channel == "brake"));
    }

    #[test]
    fn gearbox_follows_requested_gear() {
        let mut bus = SimVehicle::builder().with_all_channels().with_steering().build();
        bus.write(Channel::AutomaticGear, 8).unwrap();
        assert_eq!(bus.read(Channel::GearboxMode).unwrap(), 8);
    }

    #[test]
    fn gearbox_mode_rejects_writes() {
        let mut bus = SimVehicle::builder().with_all_channels().with_steering().build();
        assert!(matches!(
            bus.write(Channel::GearboxMode, 3),
            Err(VppError::Channel(_))
        ));
    }

    #[test]
    fn write_count_tracks_each_channel() {
        let mut bus = SimVehicle::builder().with_all_channels().with_steering().build();
        bus.write(Channel::Brake, 100).unwrap();
        bus.write(Channel::Brake, 200).unwrap();
        assert_eq!(bus.write_count(Channel::Brake), 2);
        assert_eq!(bus.write_count(Channel::Throttle), 0);
    }

    #[test]
    fn steering_requires_wheels() {
        let mut bus = SimVehicle::builder().with_all_channels().build();
        assert!(bus.set_steer_angle(5.0).is_err());

        let mut bus = SimVehicle::builder().with_steering().build();
        bus.set_steer_angle(5.0).unwrap();
        assert!((bus.steer_angle() - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn forward_speed_follows_heading() {
        let mut bus = SimVehicle::builder().build();
        bus.set_orientation(Quaternion::from_yaw(std::f32::consts::FRAC_PI_2));
        bus.set_forward_speed(2.0);
        let v = bus.velocity();
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 2.0).abs() < 1e-5);
        assert!((bus.speed() - 2.0).abs() < f32::EPSILON);
    }
}
