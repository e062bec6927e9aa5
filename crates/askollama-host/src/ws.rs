use std::sync::Arc;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::{EventBus, EventHandler, EventSource, SubscriptionError, SubscriptionHandle};

/// One host notification as sent over the socket
#[derive(Debug, Deserialize, PartialEq, Eq)]
struct EventFrame {
    event: String,
    payload: String,
}

fn decode_frame(raw: &str) -> Result<EventFrame, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Event source fed by the host's WebSocket bridge
///
/// Frames are republished on an internal [`EventBus`]; once the socket ends
/// the bus is closed and further subscriptions fail as unreachable.
///
/// Nothing is read from the socket until [`WsEventSource::start`] is called,
/// so subscribers attached before that see every frame the host sends.
pub struct WsEventSource {
    bus: EventBus,
    cancel: CancellationToken,
    start: Arc<Notify>,
    reader: JoinHandle<()>,
}

impl WsEventSource {
    pub async fn connect<I, S>(url: &str, channels: I) -> Result<Self, SubscriptionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| SubscriptionError::HostUnreachable(format!("{url}: {e}")))?;

        tracing::info!("Connected to host event bridge at {url}");

        let bus = EventBus::new(channels);
        let cancel = CancellationToken::new();
        let start = Arc::new(Notify::new());

        let reader = tokio::spawn({
            let bus = bus.clone();
            let cancel = cancel.clone();
            let start = start.clone();
            let mut ws_stream = ws_stream;
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        bus.close();
                        return;
                    }
                    _ = start.notified() => {}
                }

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        frame = ws_stream.next() => match frame {
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::warn!("Host event bridge closed");
                                break;
                            }
                            Some(Ok(msg)) if msg.is_text() => {
                                if let Ok(text) = msg.to_text() {
                                    dispatch(&bus, text);
                                }
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::error!("Host event bridge error: {e}");
                                break;
                            }
                        }
                    }
                }

                bus.close();
            }
        });

        Ok(Self {
            bus,
            cancel,
            start,
            reader,
        })
    }

    /// Begin forwarding frames to subscribers
    pub fn start(&self) {
        self.start.notify_one();
    }

    pub fn is_connected(&self) -> bool {
        !self.bus.is_closed() && !self.reader.is_finished()
    }

    /// Stop reading and close the bus
    pub fn shutdown(&self) {
        if self.is_connected() {
            tracing::info!("Closing host event bridge");
        }
        self.cancel.cancel();
    }
}

fn dispatch(bus: &EventBus, raw: &str) {
    match decode_frame(raw) {
        Ok(frame) => {
            let delivered = bus.publish(&frame.event, &frame.payload);
            tracing::debug!("{} event delivered to {delivered} subscriber(s)", frame.event);
        }
        Err(e) => tracing::warn!("Skipping undecodable host frame: {e}"),
    }
}

impl EventSource for WsEventSource {
    fn subscribe(
        &self,
        channel: &str,
        handler: EventHandler,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        self.bus.subscribe(channel, handler)
    }
}

impl Drop for WsEventSource {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
