//! `vpp-middleware` – Boundary plumbing
//!
//! Moves messages between the external transport and the tick without caring
//! what the vehicle does with them.
//!
//! # Modules
//!
//! - [`bus`] – topic-based publish/subscribe event bus built on Tokio
//!   broadcast channels.
//! - [`link`] – [`VehicleLink`][link::VehicleLink]: the trait a transport
//!   implements, an in-process [`LoopbackLink`][link::LoopbackLink], and the
//!   pumps that connect a link to the bus.
//! - [`ingestor`] – [`CommandIngestor`][ingestor::CommandIngestor]: turns
//!   wire messages into command updates.
//! - [`reporter`] – [`StatusReporter`][reporter::StatusReporter]: turns
//!   reports into wire status messages on its own publish cadence.

pub mod bus;
pub mod ingestor;
pub mod link;
pub mod reporter;

pub use bus::{EventBus, Topic, TopicReceiver};
pub use ingestor::CommandIngestor;
pub use link::{pump_inbound, pump_outbound, LoopbackLink, VehicleLink};
pub use reporter::StatusReporter;
