//! `vpp-hal` – Actuator bus abstraction
//!
//! The physics engine is an external collaborator.  This crate fixes the
//! contract the adapter speaks to it through, and ships the pieces of
//! closed-loop plumbing that sit right next to the hardware.
//!
//! # Modules
//!
//! - [`bus`] – [`VehicleBus`][bus::VehicleBus]: named integer channels
//!   (throttle, brake, gear, signal) plus steering and rigid-body state reads.
//! - [`sim`] – [`SimVehicle`][sim::SimVehicle]: in-process stub bus for tests
//!   and headless runs, built with [`SimVehicleBuilder`][sim::SimVehicleBuilder].
//! - [`pid`] – [`PidController`][pid::PidController]: generic controller with
//!   anti-windup, derivative filtering and deadband.

pub mod bus;
pub mod pid;
pub mod sim;

pub use bus::{require_channels, Channel, VehicleBus, PERCENT_MAX};
pub use pid::{PidConfig, PidController};
pub use sim::{SimVehicle, SimVehicleBuilder};
