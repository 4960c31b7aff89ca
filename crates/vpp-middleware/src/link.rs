//! The transport seam.
//!
//! The adapter never speaks to the outside world directly.  Inbound wire
//! messages and outbound status batches travel over the internal
//! [`EventBus`]; a [`VehicleLink`] carries them between the bus and a real
//! transport.  [`pump_inbound`] and [`pump_outbound`] are the two tasks that
//! connect a link to the bus.
//!
//! [`LoopbackLink`] is an in-process transport: tests and headless runs
//! inject messages into it and observe what it was asked to publish.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use vpp_types::{Event, EventPayload, InboundMessage, StatusMessages, VppError};

use crate::bus::{EventBus, Topic};

/// Every external transport implements this trait.
///
/// # Contract
///
/// * `publish_status` – hand one status batch to the transport.
/// * `inbound_stream` – a live stream of messages received from the
///   transport.  The stream ends when the transport shuts down.
#[async_trait]
pub trait VehicleLink: Send + Sync {
    /// Short name used as the event source and in log fields.
    fn name(&self) -> &str;

    /// Send one status batch to the outside world.
    ///
    /// # Errors
    ///
    /// [`VppError::Channel`] if the transport cannot accept the batch.
    async fn publish_status(&self, status: StatusMessages) -> Result<(), VppError>;

    /// Messages arriving from the outside world.
    async fn inbound_stream(&self) -> BoxStream<'static, InboundMessage>;
}

// ────────────────────────────────────────────────────────────────────────────
// LoopbackLink
// ────────────────────────────────────────────────────────────────────────────

const LOOPBACK_CAPACITY: usize = 64;

/// In-process transport backed by two broadcast channels.
#[derive(Debug, Clone)]
pub struct LoopbackLink {
    inbound: broadcast::Sender<InboundMessage>,
    outbound: broadcast::Sender<StatusMessages>,
}

impl LoopbackLink {
    pub fn new() -> Self {
        let (inbound, _) = broadcast::channel(LOOPBACK_CAPACITY);
        let (outbound, _) = broadcast::channel(LOOPBACK_CAPACITY);
        Self { inbound, outbound }
    }

    /// Deliver `message` as though it had arrived from the transport.
    ///
    /// # Errors
    ///
    /// [`VppError::Channel`] if nothing is reading the inbound stream.
    pub fn inject(&self, message: InboundMessage) -> Result<usize, VppError> {
        self.inbound
            .send(message)
            .map_err(|_| VppError::Channel("loopback inbound stream is not being read".into()))
    }

    /// Decode one JSON-encoded message (`{"kind": ..., "msg": ...}`) and
    /// [`inject`][Self::inject] it.
    ///
    /// # Errors
    ///
    /// [`VppError::Channel`] if `raw` is not a valid inbound message or
    /// nothing is reading the inbound stream.
    pub fn inject_json(&self, raw: &str) -> Result<usize, VppError> {
        let message: InboundMessage = serde_json::from_str(raw)
            .map_err(|e| VppError::Channel(format!("invalid inbound message: {e}")))?;
        self.inject(message)
    }

    /// Observe every status batch the link is asked to publish.
    pub fn status_receiver(&self) -> broadcast::Receiver<StatusMessages> {
        self.outbound.subscribe()
    }
}

impl Default for LoopbackLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VehicleLink for LoopbackLink {
    fn name(&self) -> &str {
        "loopback"
    }

    /// Publishing with no observer is not an error: a headless run has
    /// nobody listening.
    async fn publish_status(&self, status: StatusMessages) -> Result<(), VppError> {
        let _ = self.outbound.send(status);
        Ok(())
    }

    async fn inbound_stream(&self) -> BoxStream<'static, InboundMessage> {
        let receiver = self.inbound.subscribe();
        Box::pin(stream::unfold(receiver, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(message) => return Some((message, rx)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(dropped = n, "Loopback inbound stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pumps
// ────────────────────────────────────────────────────────────────────────────

/// Forward every message from `link` onto [`Topic::VehicleCommands`] until
/// the link's stream ends.  Returns the number of messages forwarded.
pub async fn pump_inbound(link: Arc<dyn VehicleLink>, bus: EventBus) -> usize {
    let source = format!("vpp-middleware::{}", link.name());
    let mut inbound = link.inbound_stream().await;
    let mut forwarded = 0;
    while let Some(message) = inbound.next().await {
        let kind = message.kind();
        match bus.publish_to(
            Topic::VehicleCommands,
            Event::new(source.clone(), EventPayload::Inbound(message)),
        ) {
            Ok(_) => forwarded += 1,
            Err(e) => debug!(kind, error = %e, "Inbound message dropped"),
        }
    }
    info!(link = link.name(), forwarded, "Inbound stream ended");
    forwarded
}

/// Hand every status batch on [`Topic::VehicleStatus`] to `link` until the
/// bus closes.
pub async fn pump_outbound(link: Arc<dyn VehicleLink>, bus: EventBus) {
    let mut status = bus.subscribe_to(Topic::VehicleStatus);
    loop {
        match status.recv().await {
            Ok(Event {
                payload: EventPayload::Status(batch),
                ..
            }) => {
                if let Err(e) = link.publish_status(batch).await {
                    warn!(link = link.name(), error = %e, "Status publish failed");
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(link = link.name(), dropped = n, "Status pump lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vpp_types::messages::{ActuationStatus, VelocityStatus};

    fn status(control_mode: u8) -> StatusMessages {
        StatusMessages {
            frame_id: "base_link".into(),
            control_mode,
            gear: 22,
            steering_tire_angle: 0.0,
            turn_indicators: 1,
            hazard_lights: 1,
            velocity: VelocityStatus::default(),
            actuation: ActuationStatus::default(),
        }
    }

    #[tokio::test]
    async fn loopback_stream_yields_injected_messages() {
        let link = LoopbackLink::new();
        let mut stream = link.inbound_stream().await;
        link.inject(InboundMessage::Gear { command: 2 }).unwrap();
        assert_eq!(stream.next().await, Some(InboundMessage::Gear { command: 2 }));
    }

    #[tokio::test]
    async fn inject_json_decodes_tagged_messages() {
        let link = LoopbackLink::new();
        let mut stream = link.inbound_stream().await;
        link.inject_json(r#"{"kind":"turn_indicators","msg":{"command":2}}"#)
            .unwrap();
        assert_eq!(
            stream.next().await,
            Some(InboundMessage::TurnIndicators { command: 2 })
        );

        let err = link.inject_json(r#"{"kind":"warp_drive","msg":{}}"#).unwrap_err();
        assert!(matches!(err, VppError::Channel(_)));
    }

    #[test]
    fn inject_without_reader_is_an_error() {
        let link = LoopbackLink::new();
        assert!(link.inject(InboundMessage::Emergency { emergency: true }).is_err());
    }

    #[tokio::test]
    async fn pump_inbound_forwards_to_bus() {
        let link = Arc::new(LoopbackLink::new());
        let bus = EventBus::default();
        let mut commands = bus.subscribe_to(Topic::VehicleCommands);

        let task = tokio::spawn(pump_inbound(link.clone(), bus.clone()));
        // Wait for the pump to subscribe to the link.
        while link.inject(InboundMessage::HazardLights { command: 2 }).is_err() {
            tokio::task::yield_now().await;
        }

        let event = tokio::time::timeout(Duration::from_secs(1), commands.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.source, "vpp-middleware::loopback");
        assert!(matches!(
            event.payload,
            EventPayload::Inbound(InboundMessage::HazardLights { command: 2 })
        ));
        task.abort();
    }

    #[tokio::test]
    async fn pump_outbound_publishes_status_batches() {
        let link = Arc::new(LoopbackLink::new());
        let mut observed = link.status_receiver();
        let bus = EventBus::default();

        let task = tokio::spawn(pump_outbound(link.clone(), bus.clone()));
        while bus.subscriber_count(Topic::VehicleStatus) == 0 {
            tokio::task::yield_now().await;
        }
        bus.publish_to(
            Topic::VehicleStatus,
            Event::new("test", EventPayload::Status(status(1))),
        )
        .unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(1), observed.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(batch.control_mode, 1);
        task.abort();
    }
}
