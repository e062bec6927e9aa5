use std::sync::Arc;

use askollama_config::host::HostConfig;
use askollama_host::{EventHandler, EventSource, SubscriptionError, SubscriptionHandle};
use askollama_types::HostEvent;
use kanal::AsyncSender;

use crate::controller::ControllerEvent;

/// The controller's two host subscriptions, released together
///
/// Dropping this releases every handle, so no handler can touch the queue
/// after teardown regardless of how the owner exits.
pub struct EventSubscriptions {
    handles: Vec<SubscriptionHandle>,
    failures: Vec<SubscriptionError>,
}

impl EventSubscriptions {
    /// Open the OCR and explanation channels, forwarding payloads onto `queue`
    ///
    /// A channel that cannot be opened is logged and recorded, never fatal.
    pub fn open(
        source: &dyn EventSource,
        config: &HostConfig,
        queue: AsyncSender<ControllerEvent>,
    ) -> Self {
        let channels: [(&str, fn(String) -> HostEvent); 2] = [
            (&config.ocr_channel, HostEvent::Ocr),
            (&config.explanation_channel, HostEvent::Explanation),
        ];

        let mut handles = Vec::new();
        let mut failures = Vec::new();

        for (channel, wrap) in channels {
            match source.subscribe(channel, forwarder(channel, wrap, queue.clone())) {
                Ok(handle) => {
                    tracing::info!("Listening for {channel} events");
                    handles.push(handle);
                }
                Err(e) => {
                    tracing::warn!("Could not subscribe to {channel}, continuing without it: {e}");
                    failures.push(e);
                }
            }
        }

        Self { handles, failures }
    }

    pub fn failures(&self) -> &[SubscriptionError] {
        &self.failures
    }

    pub fn active(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_released()).count()
    }

    /// Unsubscribe everything; safe to call more than once
    pub fn close(&mut self) {
        for handle in self.handles.drain(..) {
            handle.unsubscribe();
            tracing::debug!("Released {} subscription", handle.channel());
        }
    }
}

impl Drop for EventSubscriptions {
    fn drop(&mut self) {
        self.close();
    }
}

fn forwarder(
    channel: &str,
    wrap: fn(String) -> HostEvent,
    queue: AsyncSender<ControllerEvent>,
) -> EventHandler {
    let channel = channel.to_string();
    Arc::new(move |payload: String| {
        match queue.try_send(ControllerEvent::Host(wrap(payload))) {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Controller queue full, dropped {channel} event"),
            Err(e) => tracing::debug!("Controller gone, dropped {channel} event: {e}"),
        }
    })
}
