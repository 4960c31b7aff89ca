//! `vpp-kernel` – Per-tick actuation
//!
//! Everything that runs inside one fixed physics tick: deciding which
//! sub-routines the current control mode allows, turning the latest command
//! into pedal, steer, gear and signal setpoints, and reading the vehicle
//! state back into a [`Report`][vpp_types::Report].
//!
//! # Modules
//!
//! - [`signal_arbiter`] – collapses turn and hazard requests into the single
//!   [`VehicleSignal`][vpp_types::VehicleSignal] the vehicle shows.
//! - [`mode`] – [`Subroutines`][mode::Subroutines]: the control-mode dispatch
//!   table, and decoding of wire mode codes.
//! - [`command`] – [`CommandStore`][command::CommandStore]: the shared latest
//!   command, written by the ingest path and snapshotted once per tick.
//! - [`longitudinal`] – [`LongitudinalStrategy`][longitudinal::LongitudinalStrategy]:
//!   pedal-map or PID throttle/brake computation.
//! - [`adapter`] – [`ActuationAdapter`][adapter::ActuationAdapter]: the tick
//!   orchestrator.

pub mod adapter;
pub mod command;
pub mod longitudinal;
pub mod mode;
pub mod signal_arbiter;

pub use adapter::{strategy_from_config, ActuationAdapter, AdapterConfig};
pub use command::CommandStore;
pub use longitudinal::{LongitudinalMode, LongitudinalStrategy, Pedals};
pub use mode::{mode_from_wire, subroutines, Subroutines};
pub use signal_arbiter::resolve;
