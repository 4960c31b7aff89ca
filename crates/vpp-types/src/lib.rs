use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod geometry;
pub mod messages;

pub use geometry::{Quaternion, Vec3};
pub use messages::{InboundMessage, StatusMessages};

/// Requested or reported gearbox position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum Gear {
    #[default]
    Park,
    Reverse,
    Neutral,
    Drive,
}

impl Gear {
    /// Automatic-gear index written to the actuator bus.
    pub fn bus_index(self) -> i32 {
        match self {
            Gear::Park => 1,
            Gear::Reverse => 2,
            Gear::Neutral => 3,
            Gear::Drive => 8,
        }
    }

    /// Decode the gearbox mode read back from the actuator bus. Every forward
    /// ratio (4..=8) reports as [`Gear::Drive`]; unknown values report as
    /// [`Gear::Park`].
    pub fn from_gearbox_mode(mode: i32) -> Self {
        match mode {
            1 => Gear::Park,
            2 => Gear::Reverse,
            3 => Gear::Neutral,
            4..=8 => Gear::Drive,
            _ => Gear::Park,
        }
    }
}

/// Turn indicator request as received from the command source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum TurnSignal {
    #[default]
    None,
    Left,
    Right,
}

/// The single light-signal state applied to the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum VehicleSignal {
    #[default]
    None,
    Left,
    Right,
    Hazard,
}

impl VehicleSignal {
    /// Value written to the actuator bus signal channel.
    pub fn bus_index(self) -> i32 {
        match self {
            VehicleSignal::None => 0,
            VehicleSignal::Left => 1,
            VehicleSignal::Right => 2,
            VehicleSignal::Hazard => 3,
        }
    }

    pub fn from_bus_index(value: i32) -> Self {
        match value {
            1 => VehicleSignal::Left,
            2 => VehicleSignal::Right,
            3 => VehicleSignal::Hazard,
            _ => VehicleSignal::None,
        }
    }
}

/// Externally supplied control mode. Decides which actuation sub-routines
/// run on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum ControlMode {
    NoCommand,
    #[default]
    Autonomous,
    AutonomousSteerOnly,
    AutonomousVelocityOnly,
    Manual,
    Disengaged,
    NotReady,
}

impl ControlMode {
    pub fn to_wire(self) -> u8 {
        use messages::control_mode as code;
        match self {
            ControlMode::NoCommand => code::NO_COMMAND,
            ControlMode::Autonomous => code::AUTONOMOUS,
            ControlMode::AutonomousSteerOnly => code::AUTONOMOUS_STEER_ONLY,
            ControlMode::AutonomousVelocityOnly => code::AUTONOMOUS_VELOCITY_ONLY,
            ControlMode::Manual => code::MANUAL,
            ControlMode::Disengaged => code::DISENGAGED,
            ControlMode::NotReady => code::NOT_READY,
        }
    }
}

impl TryFrom<u8> for ControlMode {
    type Error = VppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use messages::control_mode as code;
        match value {
            code::NO_COMMAND => Ok(ControlMode::NoCommand),
            code::AUTONOMOUS => Ok(ControlMode::Autonomous),
            code::AUTONOMOUS_STEER_ONLY => Ok(ControlMode::AutonomousSteerOnly),
            code::AUTONOMOUS_VELOCITY_ONLY => Ok(ControlMode::AutonomousVelocityOnly),
            code::MANUAL => Ok(ControlMode::Manual),
            code::DISENGAGED => Ok(ControlMode::Disengaged),
            code::NOT_READY => Ok(ControlMode::NotReady),
            other => Err(VppError::UnknownControlMode(other)),
        }
    }
}

/// The latest known drive-by-wire request.
///
/// Fields are overwritten individually as inbound messages arrive; two fields
/// read on the same tick may come from different messages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Command {
    /// Target velocity in m/s. The sign selects throttle or brake.
    pub velocity: f32,
    pub acceleration_defined: bool,
    /// Target acceleration in m/s².
    pub acceleration: f32,
    pub jerk_defined: bool,
    pub jerk: f32,
    /// Steer angle in degrees, in the actuator's sign convention.
    pub steer_angle_deg: f32,
    pub steering_rate_defined: bool,
    pub steering_rate: f32,
    pub gear: Gear,
    pub turn_signal: TurnSignal,
    pub hazard: bool,
    pub emergency: bool,
    pub control_mode: ControlMode,
}

/// Per-tick status snapshot, read back from the actuator bus after the
/// tick's writes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    /// Sequence number of the tick that produced this report.
    pub tick: u64,
    pub control_mode: ControlMode,
    pub gear: Gear,
    /// Body-frame linear velocity (m/s).
    pub linear_velocity: Vec3,
    /// Body-frame angular velocity (rad/s).
    pub angular_velocity: Vec3,
    pub steer_angle_deg: f32,
    /// Throttle position in `[0, 1]`.
    pub throttle_status: f32,
    /// Brake position in `[0, 1]`.
    pub brake_status: f32,
    /// Steer deflection relative to the steering limit, in `[0, 1]`.
    pub steer_status: f32,
    pub signal: VehicleSignal,
    /// Estimated jerk (m/s³); zero unless jerk reporting was requested.
    pub jerk: f32,
}

/// Unified event wrapper for the in-process event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. `"vpp-middleware::loopback"`
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp `payload` with a fresh id and the current wall-clock time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// A message from the external command source.
    Inbound(InboundMessage),
    /// A batch of status messages for the external publisher.
    Status(StatusMessages),
    /// A fault raised by a component that must stay visible to operators.
    Fault { component: String, message: String },
}

/// Workspace error type covering configuration, calibration and bus faults.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VppError {
    #[error("Malformed calibration data at line {line}: {details}")]
    MalformedCalibrationData { line: usize, details: String },

    #[error("Pedal map is empty")]
    EmptyTable,

    #[error("Actuator bus has no '{channel}' channel")]
    MissingChannel { channel: String },

    #[error("Unknown control mode value {0}")]
    UnknownControlMode(u8),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gear_bus_index_round_trips_through_gearbox_mode() {
        for gear in [Gear::Park, Gear::Reverse, Gear::Neutral, Gear::Drive] {
            assert_eq!(Gear::from_gearbox_mode(gear.bus_index()), gear);
        }
    }

    #[test]
    fn forward_ratios_report_as_drive() {
        assert_eq!(Gear::from_gearbox_mode(4), Gear::Drive);
        assert_eq!(Gear::from_gearbox_mode(6), Gear::Drive);
        assert_eq!(Gear::from_gearbox_mode(0), Gear::Park);
        assert_eq!(Gear::from_gearbox_mode(42), Gear::Park);
    }

    #[test]
    fn control_mode_wire_codes() {
        assert_eq!(ControlMode::try_from(2), Ok(ControlMode::AutonomousSteerOnly));
        assert_eq!(ControlMode::NotReady.to_wire(), 6);
        assert_eq!(
            ControlMode::try_from(99),
            Err(VppError::UnknownControlMode(99))
        );
    }

    #[test]
    fn default_command_is_autonomous_and_parked() {
        let cmd = Command::default();
        assert_eq!(cmd.control_mode, ControlMode::Autonomous);
        assert_eq!(cmd.gear, Gear::Park);
        assert!(!cmd.emergency);
    }

    #[test]
    fn inbound_message_json_shape() {
        let msg = InboundMessage::Gear { command: messages::gear::DRIVE };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"kind\":\"gear\""));
        let back: InboundMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn vpp_error_display() {
        let err = VppError::MissingChannel {
            channel: "throttle".to_string(),
        };
        assert!(err.to_string().contains("throttle"));

        let err = VppError::MalformedCalibrationData {
            line: 3,
            details: "expected 4 cells, found 3".to_string(),
        };
        assert!(err.to_string().contains("line 3"));
    }
}
