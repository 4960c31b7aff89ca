//! [`CommandIngestor`] – wire messages in, command updates out.
//!
//! Each [`InboundMessage`] becomes exactly one batch on the
//! [`CommandStore`], so the tick sees either all of a message or none of it.
//! Numeric codes are decoded here; a code outside the known set is logged
//! and mapped to the least active value (no signal, park, no command).
//!
//! Control messages are stored even while the emergency flag is set; the
//! adapter ignores longitudinal targets for as long as the flag stays up.

use tracing::{debug, warn};
use vpp_kernel::{mode_from_wire, CommandStore};
use vpp_types::messages::{gear, hazard_lights, turn_indicators, ControlCommand};
use vpp_types::{Event, EventPayload, Gear, InboundMessage, TurnSignal};

/// Applies inbound wire messages to a shared [`CommandStore`].
#[derive(Debug, Clone)]
pub struct CommandIngestor {
    store: CommandStore,
}

impl CommandIngestor {
    pub fn new(store: CommandStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CommandStore {
        &self.store
    }

    /// Apply one inbound message.
    pub fn handle(&self, message: &InboundMessage) {
        debug!(kind = message.kind(), "Ingesting message");
        match *message {
            InboundMessage::ControlMode { mode } => {
                self.store.set_control_mode(mode_from_wire(mode));
            }
            InboundMessage::TurnIndicators { command } => {
                self.store.set_turn_signal(turn_signal_from_wire(command));
            }
            InboundMessage::HazardLights { command } => {
                self.store.set_hazard(hazard_from_wire(command));
            }
            InboundMessage::Control(control) => self.apply_control(&control),
            InboundMessage::Gear { command } => {
                self.store.set_gear(gear_from_wire(command));
            }
            InboundMessage::Emergency { emergency } => {
                if emergency {
                    warn!("Emergency requested");
                }
                self.store.set_emergency(emergency);
            }
        }
    }

    /// Apply the payload of `event` if it carries an inbound message.
    /// Returns `false` for any other payload.
    pub fn handle_event(&self, event: &Event) -> bool {
        match &event.payload {
            EventPayload::Inbound(message) => {
                self.handle(message);
                true
            }
            _ => false,
        }
    }

    fn apply_control(&self, control: &ControlCommand) {
        let lon = control.longitudinal;
        let lat = control.lateral;
        self.store.apply(|c| {
            c.velocity = lon.velocity;
            c.acceleration_defined = lon.is_defined_acceleration;
            c.acceleration = lon.acceleration;
            c.jerk_defined = lon.is_defined_jerk;
            c.jerk = lon.jerk;
            // Wire angles are positive-left radians; the actuator takes
            // positive-right degrees.
            c.steer_angle_deg = -lat.steering_tire_angle.to_degrees();
            c.steering_rate_defined = lat.is_defined_steering_tire_rotation_rate;
            c.steering_rate = lat.steering_tire_rotation_rate;
        });
    }
}

/// Decode a gear command.  NONE and unknown codes park the vehicle.
pub fn gear_from_wire(code: u8) -> Gear {
    match code {
        gear::NONE | gear::PARK => Gear::Park,
        gear::REVERSE => Gear::Reverse,
        gear::NEUTRAL => Gear::Neutral,
        gear::DRIVE | gear::LOW => Gear::Drive,
        other => {
            warn!(code = other, "Unrecognized gear command, parking");
            Gear::Park
        }
    }
}

pub fn turn_signal_from_wire(code: u8) -> TurnSignal {
    match code {
        turn_indicators::ENABLE_LEFT => TurnSignal::Left,
        turn_indicators::ENABLE_RIGHT => TurnSignal::Right,
        turn_indicators::NO_COMMAND | turn_indicators::DISABLE => TurnSignal::None,
        other => {
            warn!(code = other, "Unrecognized turn indicator command");
            TurnSignal::None
        }
    }
}

pub fn hazard_from_wire(code: u8) -> bool {
    match code {
        hazard_lights::ENABLE => true,
        hazard_lights::NO_COMMAND | hazard_lights::DISABLE => false,
        other => {
            warn!(code = other, "Unrecognized hazard lights command");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpp_types::messages::{control_mode, LateralCommand, LongitudinalCommand};
    use vpp_types::ControlMode;

    fn ingestor() -> CommandIngestor {
        CommandIngestor::new(CommandStore::new())
    }

    #[test]
    fn control_message_is_applied_as_one_batch() {
        let ing = ingestor();
        ing.handle(&InboundMessage::Control(ControlCommand {
            longitudinal: LongitudinalCommand {
                velocity: 4.0,
                acceleration: 1.2,
                jerk: 0.5,
                is_defined_acceleration: true,
                is_defined_jerk: true,
            },
            lateral: LateralCommand {
                steering_tire_angle: 0.1,
                steering_tire_rotation_rate: 0.3,
                is_defined_steering_tire_rotation_rate: true,
            },
        }));
        let cmd = ing.store().snapshot();
        assert!((cmd.velocity - 4.0).abs() < f32::EPSILON);
        assert!(cmd.acceleration_defined && cmd.jerk_defined);
        assert!((cmd.acceleration - 1.2).abs() < f32::EPSILON);
        // 0.1 rad left → 5.7296° right
        assert!((cmd.steer_angle_deg + 5.729_578).abs() < 1e-4);
        assert!(cmd.steering_rate_defined);
    }

    #[test]
    fn gear_codes_map_to_gears() {
        assert_eq!(gear_from_wire(gear::NONE), Gear::Park);
        assert_eq!(gear_from_wire(gear::PARK), Gear::Park);
        assert_eq!(gear_from_wire(gear::REVERSE), Gear::Reverse);
        assert_eq!(gear_from_wire(gear::NEUTRAL), Gear::Neutral);
        assert_eq!(gear_from_wire(gear::DRIVE), Gear::Drive);
        assert_eq!(gear_from_wire(gear::LOW), Gear::Drive);
        assert_eq!(gear_from_wire(99), Gear::Park);
    }

    #[test]
    fn signal_codes_map_to_requests() {
        assert_eq!(turn_signal_from_wire(turn_indicators::ENABLE_LEFT), TurnSignal::Left);
        assert_eq!(turn_signal_from_wire(turn_indicators::ENABLE_RIGHT), TurnSignal::Right);
        assert_eq!(turn_signal_from_wire(turn_indicators::DISABLE), TurnSignal::None);
        assert_eq!(turn_signal_from_wire(42), TurnSignal::None);
        assert!(hazard_from_wire(hazard_lights::ENABLE));
        assert!(!hazard_from_wire(hazard_lights::DISABLE));
        assert!(!hazard_from_wire(7));
    }

    #[test]
    fn unknown_control_mode_becomes_no_command() {
        let ing = ingestor();
        ing.handle(&InboundMessage::ControlMode {
            mode: control_mode::AUTONOMOUS_STEER_ONLY,
        });
        assert_eq!(ing.store().snapshot().control_mode, ControlMode::AutonomousSteerOnly);

        ing.handle(&InboundMessage::ControlMode { mode: 17 });
        assert_eq!(ing.store().snapshot().control_mode, ControlMode::NoCommand);
    }

    #[test]
    fn emergency_does_not_block_control_updates() {
        let ing = ingestor();
        ing.handle(&InboundMessage::Emergency { emergency: true });
        ing.handle(&InboundMessage::Control(ControlCommand {
            longitudinal: LongitudinalCommand {
                velocity: 2.0,
                ..LongitudinalCommand::default()
            },
            ..ControlCommand::default()
        }));
        let cmd = ing.store().snapshot();
        assert!(cmd.emergency);
        assert!((cmd.velocity - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn handle_event_ignores_other_payloads() {
        let ing = ingestor();
        let fault = Event::new(
            "test",
            EventPayload::Fault {
                component: "x".into(),
                message: "y".into(),
            },
        );
        assert!(!ing.handle_event(&fault));

        let gear_event = Event::new(
            "test",
            EventPayload::Inbound(InboundMessage::Gear { command: gear::REVERSE }),
        );
        assert!(ing.handle_event(&gear_event));
        assert_eq!(ing.store().snapshot().gear, Gear::Reverse);
    }
}
