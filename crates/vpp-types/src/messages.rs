//! Wire-level message shapes exchanged with the external transport.
//!
//! These mirror the Autoware vehicle interface: numeric enum codes are kept
//! as raw `u8` on the wire and only turned into typed values by the command
//! ingestor, so unknown codes can be logged and mapped to a safe default.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `ControlModeReport.mode` codes.
pub mod control_mode {
    pub const NO_COMMAND: u8 = 0;
    pub const AUTONOMOUS: u8 = 1;
    pub const AUTONOMOUS_STEER_ONLY: u8 = 2;
    pub const AUTONOMOUS_VELOCITY_ONLY: u8 = 3;
    pub const MANUAL: u8 = 4;
    pub const DISENGAGED: u8 = 5;
    pub const NOT_READY: u8 = 6;
}

/// `GearCommand.command` / `GearReport.report` codes.
pub mod gear {
    pub const NONE: u8 = 0;
    pub const NEUTRAL: u8 = 1;
    pub const DRIVE: u8 = 2;
    pub const REVERSE: u8 = 20;
    pub const PARK: u8 = 22;
    pub const LOW: u8 = 23;
}

/// `TurnIndicatorsCommand` / `TurnIndicatorsReport` codes.
pub mod turn_indicators {
    pub const NO_COMMAND: u8 = 0;
    pub const DISABLE: u8 = 1;
    pub const ENABLE_LEFT: u8 = 2;
    pub const ENABLE_RIGHT: u8 = 3;
}

/// `HazardLightsCommand` / `HazardLightsReport` codes.
pub mod hazard_lights {
    pub const NO_COMMAND: u8 = 0;
    pub const DISABLE: u8 = 1;
    pub const ENABLE: u8 = 2;
}

/// Longitudinal half of a control command.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct LongitudinalCommand {
    pub velocity: f32,
    pub acceleration: f32,
    pub jerk: f32,
    pub is_defined_acceleration: bool,
    pub is_defined_jerk: bool,
}

/// Lateral half of a control command. Angles are tire angles in radians,
/// positive to the left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct LateralCommand {
    pub steering_tire_angle: f32,
    pub steering_tire_rotation_rate: f32,
    pub is_defined_steering_tire_rotation_rate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ControlCommand {
    pub longitudinal: LongitudinalCommand,
    pub lateral: LateralCommand,
}

/// Every inbound message kind the adapter understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "msg", rename_all = "snake_case")]
pub enum InboundMessage {
    ControlMode { mode: u8 },
    TurnIndicators { command: u8 },
    HazardLights { command: u8 },
    Control(ControlCommand),
    Gear { command: u8 },
    Emergency { emergency: bool },
}

impl InboundMessage {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::ControlMode { .. } => "control_mode",
            InboundMessage::TurnIndicators { .. } => "turn_indicators",
            InboundMessage::HazardLights { .. } => "hazard_lights",
            InboundMessage::Control(_) => "control",
            InboundMessage::Gear { .. } => "gear",
            InboundMessage::Emergency { .. } => "emergency",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct VelocityStatus {
    pub longitudinal_velocity: f32,
    pub lateral_velocity: f32,
    pub heading_rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ActuationStatus {
    pub accel_status: f32,
    pub brake_status: f32,
    pub steer_status: f32,
}

/// One batch of outbound status messages, produced from a single report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatusMessages {
    pub frame_id: String,
    pub control_mode: u8,
    pub gear: u8,
    /// Tire angle in radians, positive to the left.
    pub steering_tire_angle: f32,
    pub turn_indicators: u8,
    pub hazard_lights: u8,
    pub velocity: VelocityStatus,
    pub actuation: ActuationStatus,
}
