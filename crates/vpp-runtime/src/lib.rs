//! `vpp-runtime` – The tick loop
//!
//! Owns the fixed-rate loop that drives the actuation adapter, and the
//! process-wide tracing setup.
//!
//! # Modules
//!
//! - [`tick_runner`] – [`TickRunner`][tick_runner::TickRunner]: drains
//!   inbound messages between ticks, steps the adapter, and publishes status
//!   on the reporter's cadence until a shutdown flag is raised.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.
//!   Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.

pub mod telemetry;
pub mod tick_runner;

pub use telemetry::{init_tracing, LogFormat, TracerProviderGuard};
pub use tick_runner::{RunSummary, TickRunner};
