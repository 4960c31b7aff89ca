//! [`StatusReporter`] – reports out, on the transport's cadence.
//!
//! The adapter rebuilds its [`Report`] every physics tick.  The reporter
//! accumulates tick time and only emits a [`StatusMessages`] batch once a
//! publish interval has elapsed, so the outbound rate is independent of the
//! tick rate.  The interval is shaved by 10 µs so that a tick period which
//! divides the interval exactly is not pushed one tick late by rounding.

use tracing::warn;
use vpp_types::messages::{
    gear, hazard_lights, turn_indicators, ActuationStatus, VelocityStatus,
};
use vpp_types::{Gear, Report, StatusMessages, VehicleSignal};

pub const MIN_PUBLISH_HZ: u32 = 1;
pub const MAX_PUBLISH_HZ: u32 = 60;
pub const DEFAULT_FRAME_ID: &str = "base_link";

/// Rate-gated translator from [`Report`] to [`StatusMessages`].
#[derive(Debug, Clone)]
pub struct StatusReporter {
    frame_id: String,
    publish_hz: u32,
    timer: f32,
}

impl StatusReporter {
    /// Create a reporter publishing at `publish_hz`, clamped to
    /// `[MIN_PUBLISH_HZ, MAX_PUBLISH_HZ]`.
    pub fn new(publish_hz: u32) -> Self {
        let clamped = publish_hz.clamp(MIN_PUBLISH_HZ, MAX_PUBLISH_HZ);
        if clamped != publish_hz {
            warn!(requested = publish_hz, used = clamped, "Publish rate out of range");
        }
        Self {
            frame_id: DEFAULT_FRAME_ID.to_string(),
            publish_hz: clamped,
            timer: 0.0,
        }
    }

    pub fn with_frame_id(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = frame_id.into();
        self
    }

    pub fn publish_hz(&self) -> u32 {
        self.publish_hz
    }

    /// Seconds between two published batches.
    pub fn interval(&self) -> f32 {
        1.0 / self.publish_hz as f32 - 0.000_01
    }

    /// Advance the publish timer by one tick of `dt` seconds.  Returns the
    /// translated batch when a publish is due.
    pub fn on_tick(&mut self, report: &Report, dt: f32) -> Option<StatusMessages> {
        self.timer += dt;
        if self.timer < self.interval() {
            return None;
        }
        self.timer = 0.0;
        Some(self.translate(report))
    }

    /// Translate `report` regardless of the publish timer.
    pub fn translate(&self, report: &Report) -> StatusMessages {
        StatusMessages {
            frame_id: self.frame_id.clone(),
            control_mode: report.control_mode.to_wire(),
            gear: gear_to_wire(report.gear),
            // Actuator degrees are positive-right; the wire wants
            // positive-left radians.
            steering_tire_angle: -report.steer_angle_deg.to_radians(),
            turn_indicators: turn_indicators_to_wire(report.signal),
            hazard_lights: hazard_lights_to_wire(report.signal),
            velocity: VelocityStatus {
                longitudinal_velocity: report.linear_velocity.x,
                lateral_velocity: report.linear_velocity.y,
                heading_rate: report.angular_velocity.z,
            },
            actuation: ActuationStatus {
                accel_status: report.throttle_status,
                brake_status: report.brake_status,
                steer_status: report.steer_status,
            },
        }
    }
}

pub fn gear_to_wire(g: Gear) -> u8 {
    match g {
        Gear::Park => gear::PARK,
        Gear::Reverse => gear::REVERSE,
        Gear::Neutral => gear::NEUTRAL,
        Gear::Drive => gear::DRIVE,
    }
}

/// Hazard is reported on its own message, so the turn indicators read as
/// disabled while it is on.
pub fn turn_indicators_to_wire(signal: VehicleSignal) -> u8 {
    match signal {
        VehicleSignal::Left => turn_indicators::ENABLE_LEFT,
        VehicleSignal::Right => turn_indicators::ENABLE_RIGHT,
        VehicleSignal::None | VehicleSignal::Hazard => turn_indicators::DISABLE,
    }
}

pub fn hazard_lights_to_wire(signal: VehicleSignal) -> u8 {
    match signal {
        VehicleSignal::Hazard => hazard_lights::ENABLE,
        _ => hazard_lights::DISABLE,
    }
}
