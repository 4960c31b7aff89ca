//! [`ActuationAdapter`] – the per-tick orchestrator.
//!
//! Once per fixed physics tick the runtime hands the adapter a snapshot of
//! the latest [`Command`].  The adapter runs the sub-routines the command's
//! control mode allows, writes the resulting setpoints to the
//! [`VehicleBus`], and reads the bus back into a fresh [`Report`].
//!
//! A tick never fails.  A bus write that is rejected is logged and the rest
//! of the tick carries on; an empty pedal map releases both pedals for that
//! tick.  Only construction can fail, when the bus is missing a channel the
//! adapter needs.
//!
//! # Example
//!
//! ```rust
//! use vpp_calibration::PedalMap;
//! use vpp_hal::{Channel, SimVehicle, VehicleBus};
//! use vpp_kernel::{ActuationAdapter, AdapterConfig, LongitudinalStrategy};
//! use vpp_types::{Command, Gear};
//!
//! let bus = SimVehicle::builder().with_all_channels().with_steering().build();
//! let strategy = LongitudinalStrategy::pedal_map(PedalMap::default(), PedalMap::default());
//! let mut adapter = ActuationAdapter::new(bus, AdapterConfig::default(), strategy).unwrap();
//!
//! let command = Command { gear: Gear::Drive, ..Command::default() };
//! let report = adapter.step(&command, 0.02);
//! assert_eq!(report.gear, Gear::Drive);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};
use vpp_calibration::{PedalMap, PedalRemap};
use vpp_hal::{require_channels, Channel, PidConfig, VehicleBus, PERCENT_MAX};
use vpp_types::{Command, Gear, Report, VehicleSignal, VppError};

use crate::longitudinal::{LongitudinalMode, LongitudinalStrategy, Pedals};
use crate::mode::subroutines;
use crate::signal_arbiter::resolve;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Tunables for [`ActuationAdapter`].  Every field has a default, so a
/// partial TOML table deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Which longitudinal strategy to build.
    pub longitudinal: LongitudinalMode,
    /// Brake dial applied while the emergency flag is set, in `[0, 100]`.
    pub emergency_brake_percent: f32,
    /// Move the steer angle toward the target at a bounded rate instead of
    /// setting it directly.
    pub simulate_steering_wheel: bool,
    /// Maximum steer change per tick, in degrees.
    pub steer_wheel_rate_per_tick: f32,
    /// Steer angle reported as a steer status of `1.0`.
    pub max_steer_angle_deg: f32,
    pub pid: PidConfig,
    pub throttle_remap: PedalRemap,
    pub brake_remap: PedalRemap,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            longitudinal: LongitudinalMode::PedalMap,
            emergency_brake_percent: 100.0,
            simulate_steering_wheel: false,
            steer_wheel_rate_per_tick: 0.5,
            max_steer_angle_deg: 35.0,
            pid: PidConfig::default(),
            throttle_remap: PedalRemap::THROTTLE,
            brake_remap: PedalRemap::BRAKE,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ActuationAdapter
// ────────────────────────────────────────────────────────────────────────────

/// Drives one vehicle's actuator bus from the latest command.
pub struct ActuationAdapter<B: VehicleBus> {
    bus: B,
    config: AdapterConfig,
    longitudinal: LongitudinalStrategy,
    report: Report,
    tick: u64,
    previous_acceleration: f32,
    jerk: f32,
}

impl<B: VehicleBus> ActuationAdapter<B> {
    /// Wrap `bus`, checking that it wires every channel the adapter uses.
    ///
    /// # Errors
    ///
    /// [`VppError::MissingChannel`] when the bus lacks a channel or steered
    /// wheels.
    pub fn new(
        bus: B,
        config: AdapterConfig,
        longitudinal: LongitudinalStrategy,
    ) -> Result<Self, VppError> {
        require_channels(&bus, &Channel::ALL)?;
        Ok(Self {
            bus,
            config,
            longitudinal,
            report: Report::default(),
            tick: 0,
            previous_acceleration: 0.0,
            jerk: 0.0,
        })
    }

    /// Run one tick for `command`, `dt` seconds after the previous one, and
    /// return the refreshed report.
    #[instrument(level = "debug", skip_all, fields(tick = self.tick + 1, mode = ?command.control_mode))]
    pub fn step(&mut self, command: &Command, dt: f32) -> &Report {
        self.tick += 1;
        let speed = self.bus.speed();
        let routines = subroutines(command.control_mode);

        if routines.signal {
            self.handle_signal(command);
        }
        if routines.steer {
            self.handle_steer(command);
        }
        if routines.gear {
            self.write(Channel::AutomaticGear, command.gear.bus_index());
        }
        if routines.accel {
            self.handle_acceleration(command, speed, dt);
        }

        self.report = self.build_report(command, speed);
        &self.report
    }

    /// The report built by the most recent [`step`][Self::step].
    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    // ── Sub-routines ─────────────────────────────────────────────────────────

    fn handle_signal(&mut self, command: &Command) {
        let signal = resolve(command.turn_signal, command.hazard);
        self.write(Channel::Signal, signal.bus_index());
    }

    fn handle_steer(&mut self, command: &Command) {
        let target = command.steer_angle_deg;
        let angle = if self.config.simulate_steering_wheel {
            let current = self.bus.steer_angle();
            let rate = self.config.steer_wheel_rate_per_tick.abs().max(0.0);
            current + (target - current).clamp(-rate, rate)
        } else {
            target
        };
        if let Err(e) = self.bus.set_steer_angle(angle) {
            error!(error = %e, "Steer write failed");
        }
    }

    fn handle_acceleration(&mut self, command: &Command, speed: f32, dt: f32) {
        self.jerk = if command.jerk_defined {
            let acceleration = self.bus.local_acceleration().length();
            let jerk = if dt > 0.0 {
                (acceleration - self.previous_acceleration) / dt
            } else {
                0.0
            };
            self.previous_acceleration = acceleration;
            jerk
        } else {
            0.0
        };

        let pedals = if command.emergency {
            self.longitudinal.reset();
            Pedals::brake(PedalRemap::DIAL.apply(self.config.emergency_brake_percent))
        } else {
            match self.longitudinal.compute(command, speed, dt) {
                Ok(pedals) => pedals,
                Err(e) => {
                    warn!(error = %e, "Longitudinal lookup failed, releasing pedals");
                    Pedals::RELEASED
                }
            }
        };

        self.write(Channel::Throttle, pedals.throttle);
        self.write(Channel::Brake, pedals.brake);
    }

    // ── Bus helpers ──────────────────────────────────────────────────────────

    fn write(&mut self, channel: Channel, value: i32) {
        if let Err(e) = self.bus.write(channel, value) {
            error!(%channel, value, error = %e, "Bus write failed");
        }
    }

    fn read_or_zero(&self, channel: Channel) -> i32 {
        self.bus.read(channel).unwrap_or_else(|e| {
            error!(%channel, error = %e, "Bus read failed");
            0
        })
    }

    fn build_report(&self, command: &Command, speed: f32) -> Report {
        let orientation = self.bus.orientation();
        let steer_angle_deg = self.bus.steer_angle();
        let max_steer = self.config.max_steer_angle_deg;
        let steer_status = if max_steer > 0.0 {
            (steer_angle_deg.abs() / max_steer).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Report {
            tick: self.tick,
            control_mode: command.control_mode,
            gear: Gear::from_gearbox_mode(self.read_or_zero(Channel::GearboxMode)),
            linear_velocity: orientation
                .inverse_rotate(self.bus.velocity().normalized().scale(speed)),
            angular_velocity: orientation.inverse_rotate(self.bus.angular_velocity()),
            steer_angle_deg,
            throttle_status: pedal_status(self.read_or_zero(Channel::Throttle)),
            brake_status: pedal_status(self.read_or_zero(Channel::Brake)),
            steer_status,
            signal: VehicleSignal::from_bus_index(self.read_or_zero(Channel::Signal)),
            jerk: self.jerk,
        }
    }
}

fn pedal_status(raw: i32) -> f32 {
    (raw as f32 / PERCENT_MAX as f32).clamp(0.0, 1.0)
}

/// Build the strategy `config` asks for from already loaded pedal maps.
pub fn strategy_from_config(
    config: &AdapterConfig,
    accel: PedalMap,
    brake: PedalMap,
) -> LongitudinalStrategy {
    let strategy = match config.longitudinal {
        LongitudinalMode::PedalMap => LongitudinalStrategy::pedal_map(accel, brake),
        LongitudinalMode::Pid => LongitudinalStrategy::pid(config.pid),
    };
    strategy.with_remaps(config.throttle_remap, config.brake_remap)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use vpp_hal::SimVehicle;
    use vpp_types::{ControlMode, Quaternion, TurnSignal, Vec3};

    use super::*;

    const ACCEL: &str = "speed,0,10,20\n0.1,1.0,0.8,0.5\n0.25,3.0,2.5,2.0\n";
    const BRAKE: &str = "speed,0,10,20\n0.1,-1.0,-1.0,-1.0\n0.4,-3.0,-3.0,-3.0\n";

    fn full_bus() -> SimVehicle {
        SimVehicle::builder().with_all_channels().with_steering().build()
    }

    fn adapter_with(config: AdapterConfig) -> ActuationAdapter<SimVehicle> {
        let strategy = strategy_from_config(
            &config,
            PedalMap::parse(ACCEL).unwrap(),
            PedalMap::parse(BRAKE).unwrap(),
        );
        ActuationAdapter::new(full_bus(), config, strategy).unwrap()
    }

    fn adapter() -> ActuationAdapter<SimVehicle> {
        adapter_with(AdapterConfig::default())
    }

    /// A vehicle whose `broken` channel rejects every read and write.
    struct FaultyBus {
        inner: SimVehicle,
        broken: Channel,
    }

    impl VehicleBus for FaultyBus {
        fn id(&self) -> &str {
            self.inner.id()
        }
        fn has_channel(&self, channel: Channel) -> bool {
            self.inner.has_channel(channel)
        }
        fn has_steering(&self) -> bool {
            self.inner.has_steering()
        }
        fn read(&self, channel: Channel) -> Result<i32, VppError> {
            if channel == self.broken {
                return Err(VppError::Channel(format!("{channel} read timed out")));
            }
            self.inner.read(channel)
        }
        fn write(&mut self, channel: Channel, value: i32) -> Result<(), VppError> {
            if channel == self.broken {
                return Err(VppError::Channel(format!("{channel} write rejected")));
            }
            self.inner.write(channel, value)
        }
        fn steer_angle(&self) -> f32 {
            self.inner.steer_angle()
        }
        fn set_steer_angle(&mut self, angle_deg: f32) -> Result<(), VppError> {
            self.inner.set_steer_angle(angle_deg)
        }
        fn speed(&self) -> f32 {
            self.inner.speed()
        }
        fn local_acceleration(&self) -> Vec3 {
            self.inner.local_acceleration()
        }
        fn velocity(&self) -> Vec3 {
            self.inner.velocity()
        }
        fn angular_velocity(&self) -> Vec3 {
            self.inner.angular_velocity()
        }
        fn orientation(&self) -> Quaternion {
            self.inner.orientation()
        }
    }

    #[test]
    fn failing_channel_does_not_stop_the_tick() {
        let config = AdapterConfig::default();
        let strategy = strategy_from_config(
            &config,
            PedalMap::parse(ACCEL).unwrap(),
            PedalMap::parse(BRAKE).unwrap(),
        );
        let bus = FaultyBus {
            inner: full_bus(),
            broken: Channel::Throttle,
        };
        let mut a = ActuationAdapter::new(bus, config, strategy).unwrap();
        let cmd = Command {
            velocity: 5.0,
            acceleration: 2.6,
            steer_angle_deg: 6.0,
            gear: Gear::Drive,
            turn_signal: TurnSignal::Right,
            ..Command::default()
        };

        let report = *a.step(&cmd, 0.02);
        assert_eq!(report.tick, 1);
        assert_eq!(report.gear, Gear::Drive);
        assert_eq!(report.signal, VehicleSignal::Right);
        assert_eq!(report.throttle_status, 0.0);

        let inner = &a.bus().inner;
        assert_eq!(inner.write_count(Channel::Throttle), 0);
        assert_eq!(inner.write_count(Channel::Brake), 1);
        assert_eq!(inner.read(Channel::AutomaticGear).unwrap(), 8);
        assert!((inner.steer_angle() - 6.0).abs() < f32::EPSILON);

        assert_eq!(a.step(&cmd, 0.02).tick, 2);
    }

    #[test]
    fn nan_steer_rate_holds_the_wheel() {
        let mut a = adapter_with(AdapterConfig {
            simulate_steering_wheel: true,
            steer_wheel_rate_per_tick: f32::NAN,
            ..AdapterConfig::default()
        });
        let cmd = Command {
            steer_angle_deg: 10.0,
            ..Command::default()
        };
        a.step(&cmd, 0.02);
        assert_eq!(a.bus().steer_angle(), 0.0);
    }

    #[test]
    fn missing_channel_is_fatal_at_construction() {
        let bus = SimVehicle::builder()
            .with_channel(Channel::Throttle)
            .with_channel(Channel::Brake)
            .with_steering()
            .build();
        let strategy = LongitudinalStrategy::pid(PidConfig::default());
        let err = ActuationAdapter::new(bus, AdapterConfig::default(), strategy)
            .err()
            .unwrap();
        assert_eq!(
            err,
            VppError::MissingChannel {
                channel: "automatic_gear".to_string()
            }
        );
    }

    #[test]
    fn missing_wheels_are_fatal_at_construction() {
        let bus = SimVehicle::builder().with_all_channels().build();
        let strategy = LongitudinalStrategy::pid(PidConfig::default());
        assert!(ActuationAdapter::new(bus, AdapterConfig::default(), strategy).is_err());
    }

    #[test]
    fn autonomous_tick_writes_every_setpoint() {
        let mut a = adapter();
        a.bus_mut().set_forward_speed(9.0);
        let cmd = Command {
            velocity: 5.0,
            acceleration: 2.6,
            steer_angle_deg: -4.0,
            gear: Gear::Drive,
            turn_signal: TurnSignal::Left,
            ..Command::default()
        };
        let report = *a.step(&cmd, 0.02);

        assert_eq!(a.bus().read(Channel::Throttle).unwrap(), 2500);
        assert_eq!(a.bus().read(Channel::Brake).unwrap(), 0);
        assert_eq!(a.bus().read(Channel::AutomaticGear).unwrap(), 8);
        assert!((a.bus().steer_angle() + 4.0).abs() < f32::EPSILON);

        assert_eq!(report.tick, 1);
        assert_eq!(report.gear, Gear::Drive);
        assert_eq!(report.signal, VehicleSignal::Left);
        assert!((report.throttle_status - 0.25).abs() < 1e-6);
        assert_eq!(report.brake_status, 0.0);
    }

    #[test]
    fn brake_releases_throttle() {
        let mut a = adapter();
        a.step(&Command { velocity: 5.0, acceleration: 2.6, ..Command::default() }, 0.02);
        a.step(&Command { velocity: -1.0, acceleration: -2.8, ..Command::default() }, 0.02);
        assert_eq!(a.bus().read(Channel::Throttle).unwrap(), 0);
        assert_eq!(a.bus().read(Channel::Brake).unwrap(), 4000);
    }

    #[test]
    fn steer_only_never_touches_pedals() {
        let mut a = adapter();
        let cmd = Command {
            velocity: 5.0,
            acceleration: 2.0,
            steer_angle_deg: 10.0,
            control_mode: ControlMode::AutonomousSteerOnly,
            ..Command::default()
        };
        for _ in 0..5 {
            a.step(&cmd, 0.02);
        }
        assert_eq!(a.bus().write_count(Channel::Throttle), 0);
        assert_eq!(a.bus().write_count(Channel::Brake), 0);
        assert_eq!(a.bus().write_count(Channel::AutomaticGear), 5);
        assert!((a.bus().steer_angle() - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn velocity_only_never_steers() {
        let mut a = adapter();
        let cmd = Command {
            velocity: 5.0,
            acceleration: 2.6,
            steer_angle_deg: 10.0,
            control_mode: ControlMode::AutonomousVelocityOnly,
            ..Command::default()
        };
        a.step(&cmd, 0.02);
        assert_eq!(a.bus().steer_angle(), 0.0);
        assert_eq!(a.bus().write_count(Channel::Throttle), 1);
    }

    #[test]
    fn idle_modes_write_nothing_but_still_report() {
        for mode in [
            ControlMode::NoCommand,
            ControlMode::Manual,
            ControlMode::Disengaged,
            ControlMode::NotReady,
        ] {
            let mut a = adapter();
            let cmd = Command {
                velocity: 5.0,
                gear: Gear::Drive,
                hazard: true,
                control_mode: mode,
                ..Command::default()
            };
            let report = *a.step(&cmd, 0.02);
            for channel in Channel::ALL {
                assert_eq!(a.bus().write_count(channel), 0, "{mode:?} wrote {channel}");
            }
            assert_eq!(report.tick, 1);
            assert_eq!(report.control_mode, mode);
        }
    }

    #[test]
    fn emergency_applies_configured_brake() {
        let mut a = adapter();
        let cmd = Command {
            velocity: 5.0,
            acceleration: 5.0,
            emergency: true,
            ..Command::default()
        };
        a.step(&cmd, 0.02);
        assert_eq!(a.bus().read(Channel::Throttle).unwrap(), 0);
        assert_eq!(a.bus().read(Channel::Brake).unwrap(), PERCENT_MAX);

        let mut a = adapter_with(AdapterConfig {
            emergency_brake_percent: 40.0,
            ..AdapterConfig::default()
        });
        a.step(&cmd, 0.02);
        assert_eq!(a.bus().read(Channel::Brake).unwrap(), 4000);
    }

    #[test]
    fn empty_pedal_map_releases_pedals() {
        let strategy = LongitudinalStrategy::pedal_map(PedalMap::default(), PedalMap::default());
        let mut a = ActuationAdapter::new(full_bus(), AdapterConfig::default(), strategy).unwrap();
        a.bus_mut().write(Channel::Throttle, 3000).unwrap();

        let report = *a.step(&Command { velocity: 3.0, acceleration: 1.0, ..Command::default() }, 0.02);
        assert_eq!(a.bus().read(Channel::Throttle).unwrap(), 0);
        assert_eq!(a.bus().read(Channel::Brake).unwrap(), 0);
        assert_eq!(report.tick, 1);
    }

    #[test]
    fn simulated_wheel_is_rate_limited_without_overshoot() {
        let mut a = adapter_with(AdapterConfig {
            simulate_steering_wheel: true,
            steer_wheel_rate_per_tick: 0.5,
            ..AdapterConfig::default()
        });
        let cmd = Command {
            steer_angle_deg: 2.2,
            ..Command::default()
        };
        a.step(&cmd, 0.02);
        assert!((a.bus().steer_angle() - 0.5).abs() < 1e-6);
        for _ in 0..10 {
            a.step(&cmd, 0.02);
            assert!(a.bus().steer_angle() <= 2.2 + 1e-6);
        }
        assert!((a.bus().steer_angle() - 2.2).abs() < 1e-6);

        let back = Command {
            steer_angle_deg: -1.0,
            ..Command::default()
        };
        a.step(&back, 0.02);
        assert!((a.bus().steer_angle() - 1.7).abs() < 1e-5);
    }

    #[test]
    fn velocities_are_reported_in_body_frame() {
        let mut a = adapter();
        // Heading +90° about z: the body x axis points along world y.
        a.bus_mut().set_orientation(Quaternion::from_yaw(FRAC_PI_2));
        a.bus_mut().set_forward_speed(3.0);
        a.bus_mut().set_angular_velocity(Vec3::new(0.0, 0.0, 0.4));

        let report = *a.step(&Command::default(), 0.02);
        assert!((report.linear_velocity.x - 3.0).abs() < 1e-4);
        assert!(report.linear_velocity.y.abs() < 1e-4);
        assert!((report.angular_velocity.z - 0.4).abs() < 1e-5);
    }

    #[test]
    fn hazard_overrides_turn_signal_on_the_bus() {
        let mut a = adapter();
        let cmd = Command {
            turn_signal: TurnSignal::Right,
            hazard: true,
            ..Command::default()
        };
        let report = *a.step(&cmd, 0.02);
        assert_eq!(a.bus().read(Channel::Signal).unwrap(), VehicleSignal::Hazard.bus_index());
        assert_eq!(report.signal, VehicleSignal::Hazard);
    }

    #[test]
    fn steer_status_is_normalized() {
        let mut a = adapter();
        let report = *a.step(&Command { steer_angle_deg: -17.5, ..Command::default() }, 0.02);
        assert!((report.steer_status - 0.5).abs() < 1e-6);
        let report = *a.step(&Command { steer_angle_deg: 70.0, ..Command::default() }, 0.02);
        assert_eq!(report.steer_status, 1.0);
    }

    #[test]
    fn jerk_is_estimated_only_when_requested() {
        let mut a = adapter();
        let cmd = Command {
            jerk_defined: true,
            ..Command::default()
        };
        a.bus_mut().set_local_acceleration(Vec3::new(1.0, 0.0, 0.0));
        let report = *a.step(&cmd, 0.5);
        assert!((report.jerk - 2.0).abs() < 1e-5);
        let report = *a.step(&cmd, 0.5);
        assert!(report.jerk.abs() < 1e-6);

        let report = *a.step(&Command::default(), 0.5);
        assert_eq!(report.jerk, 0.0);
    }

    #[test]
    fn pid_strategy_selected_by_config() {
        let mut a = adapter_with(AdapterConfig {
            longitudinal: LongitudinalMode::Pid,
            ..AdapterConfig::default()
        });
        a.step(&Command { velocity: 10.0, ..Command::default() }, 0.02);
        assert!(a.bus().read(Channel::Throttle).unwrap() > 0);
        assert_eq!(a.bus().read(Channel::Brake).unwrap(), 0);
    }

    #[test]
    fn config_table_parses_partially() {
        let config: AdapterConfig = toml::from_str(
            "simulate_steering_wheel = true\n[pid]\nkp = 2.0\n",
        )
        .unwrap();
        assert!(config.simulate_steering_wheel);
        assert!((config.pid.kp - 2.0).abs() < f32::EPSILON);
        assert!((config.pid.ki - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.throttle_remap, PedalRemap::THROTTLE);
    }
}
