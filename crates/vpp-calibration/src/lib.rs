//! `vpp-calibration` – Pedal calibration tables
//!
//! Turns an acceleration request into a pedal position using a measured
//! table, and scales pedal positions into actuator bus units.
//!
//! # Modules
//!
//! - [`pedal_map`] – [`PedalMap`][pedal_map::PedalMap]: CSV loading and
//!   nearest-neighbour lookup of "pedal % for this acceleration at this
//!   speed".
//! - [`remap`] – [`PedalRemap`][remap::PedalRemap]: linear range mapping
//!   into the bus's percent-as-integer scale.

pub mod pedal_map;
pub mod remap;

pub use pedal_map::PedalMap;
pub use remap::{remap, PedalRemap};
