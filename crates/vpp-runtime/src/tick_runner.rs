//! [`TickRunner`] – the fixed-rate bridge loop.
//!
//! Every tick the runner:
//!
//! 1. **Drains** inbound events already buffered on
//!    [`Topic::VehicleCommands`] into the [`CommandStore`].
//! 2. **Snapshots** the stored command.
//! 3. **Steps** the [`ActuationAdapter`] with that snapshot.
//! 4. **Reports** through the [`StatusReporter`], publishing a status batch
//!    on [`Topic::VehicleStatus`] when one is due.
//!
//! The loop stops at the next tick boundary after the shutdown flag is
//! raised.
//!
//! # Example
//!
//! ```rust,no_run
//! use vpp_hal::{PidConfig, SimVehicle};
//! use vpp_kernel::{ActuationAdapter, AdapterConfig, LongitudinalStrategy};
//! use vpp_middleware::{EventBus, StatusReporter};
//! use vpp_runtime::TickRunner;
//!
//! # async fn demo() -> Result<(), vpp_types::VppError> {
//! let bus = SimVehicle::builder().with_all_channels().with_steering().build();
//! let adapter = ActuationAdapter::new(
//!     bus,
//!     AdapterConfig::default(),
//!     LongitudinalStrategy::pid(PidConfig::default()),
//! )?;
//! let runner = TickRunner::new(adapter, StatusReporter::new(30), EventBus::default(), 50);
//! let summary = runner.run().await;
//! println!("ran {} ticks", summary.ticks);
//! # Ok(())
//! # }
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use vpp_hal::VehicleBus;
use vpp_kernel::{ActuationAdapter, CommandStore};
use vpp_middleware::{CommandIngestor, EventBus, StatusReporter, Topic, TopicReceiver};
use vpp_types::{Event, EventPayload, Report};

const SOURCE: &str = "vpp-runtime::tick_runner";

/// Counters returned when [`TickRunner::run`] exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub published: u64,
}

/// Drives one [`ActuationAdapter`] from the event bus.
pub struct TickRunner<B: VehicleBus> {
    adapter: ActuationAdapter<B>,
    ingestor: CommandIngestor,
    reporter: StatusReporter,
    bus: EventBus,
    commands: TopicReceiver,
    tick_hz: u32,
    shutdown: Arc<AtomicBool>,
    summary: RunSummary,
}

impl<B: VehicleBus> TickRunner<B> {
    /// Build a runner ticking at `tick_hz` (at least 1).  Subscribes to
    /// [`Topic::VehicleCommands`] immediately, so messages published after
    /// this call are seen by the first tick.
    pub fn new(adapter: ActuationAdapter<B>, reporter: StatusReporter, bus: EventBus, tick_hz: u32) -> Self {
        let commands = bus.subscribe_to(Topic::VehicleCommands);
        Self {
            adapter,
            ingestor: CommandIngestor::new(CommandStore::new()),
            reporter,
            bus,
            commands,
            tick_hz: tick_hz.max(1),
            shutdown: Arc::new(AtomicBool::new(false)),
            summary: RunSummary::default(),
        }
    }

    /// Flag that stops [`run`][Self::run] when set to `true`.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn store(&self) -> &CommandStore {
        self.ingestor.store()
    }

    pub fn adapter(&self) -> &ActuationAdapter<B> {
        &self.adapter
    }

    /// The event bus the runner drains and publishes on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz))
    }

    /// Run ticks at the configured rate until the shutdown flag is raised.
    pub async fn run(mut self) -> RunSummary {
        let mut interval = tokio::time::interval(self.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            tick_hz = self.tick_hz,
            publish_hz = self.reporter.publish_hz(),
            bus = self.adapter.bus().id(),
            "Tick loop started"
        );

        while !self.shutdown.load(Ordering::Acquire) {
            interval.tick().await;
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            self.tick_once();
        }

        info!(
            ticks = self.summary.ticks,
            published = self.summary.published,
            "Tick loop stopped"
        );
        self.summary
    }

    /// Execute one tick synchronously and return its report.
    pub fn tick_once(&mut self) -> Report {
        self.drain_commands();

        let command = self.store().snapshot();
        let dt = 1.0 / self.tick_hz as f32;
        let report = *self.adapter.step(&command, dt);
        self.summary.ticks += 1;

        if let Some(batch) = self.reporter.on_tick(&report, dt) {
            self.summary.published += 1;
            if let Err(e) = self
                .bus
                .publish_to(Topic::VehicleStatus, Event::new(SOURCE, EventPayload::Status(batch)))
            {
                debug!(error = %e, "Status batch not delivered");
            }
        }
        report
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Apply every inbound event buffered since the previous tick.
    fn drain_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(event) => {
                    self.ingestor.handle_event(&event);
                }
                Err(TryRecvError::Lagged(n)) => {
                    warn!(dropped = n, "Inbound commands overflowed between ticks");
                    let fault = Event::new(
                        SOURCE,
                        EventPayload::Fault {
                            component: "tick_runner".to_string(),
                            message: format!("{n} inbound messages dropped"),
                        },
                    );
                    let _ = self.bus.publish_to(Topic::SystemAlerts, fault);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
