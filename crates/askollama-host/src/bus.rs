use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use askollama_types::{EXPLANATION_CHANNEL, OCR_CHANNEL};

use crate::{EventHandler, EventSource, SubscriptionError};

#[derive(Default)]
struct Registry {
    channels: HashMap<String, Vec<(u64, EventHandler)>>,
    next_id: u64,
    closed: bool,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process event source over a fixed set of channels
///
/// Handlers run synchronously inside `publish`, while the registry lock is held.
/// This gives per-channel delivery in publish order and makes `unsubscribe`
/// a hard barrier. Handlers must not subscribe or unsubscribe from inside the callback.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let channels = channels
            .into_iter()
            .map(|name| (name.into(), Vec::new()))
            .collect();

        Self {
            registry: Arc::new(Mutex::new(Registry {
                channels,
                ..Registry::default()
            })),
        }
    }

    /// Bus with the OCR and explanation channels declared
    pub fn with_screenshot_channels() -> Self {
        Self::new([OCR_CHANNEL, EXPLANATION_CHANNEL])
    }

    /// Deliver `payload` to every live subscriber, returning how many were called
    pub fn publish(&self, channel: &str, payload: &str) -> usize {
        let registry = lock(&self.registry);
        let Some(handlers) = registry.channels.get(channel) else {
            tracing::warn!("publish on undeclared channel {channel}");
            return 0;
        };

        for (_, handler) in handlers {
            handler(payload.to_string());
        }
        handlers.len()
    }

    /// Drop every handler and refuse new subscriptions
    pub fn close(&self) {
        let mut registry = lock(&self.registry);
        registry.closed = true;
        for handlers in registry.channels.values_mut() {
            handlers.clear();
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.registry).closed
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        lock(&self.registry)
            .channels
            .get(channel)
            .map_or(0, Vec::len)
    }
}

impl EventSource for EventBus {
    fn subscribe(
        &self,
        channel: &str,
        handler: EventHandler,
    ) -> Result<SubscriptionHandle, SubscriptionError> {
        let mut registry = lock(&self.registry);
        if registry.closed {
            return Err(SubscriptionError::HostUnreachable(format!(
                "event bridge closed, cannot open {channel}"
            )));
        }

        let id = registry.next_id;
        let handlers = registry
            .channels
            .get_mut(channel)
            .ok_or_else(|| SubscriptionError::UnknownChannel(channel.to_string()))?;
        handlers.push((id, handler));
        registry.next_id += 1;

        tracing::debug!("subscribed to {channel} (id {id})");

        Ok(SubscriptionHandle {
            channel: channel.to_string(),
            id,
            registry: Arc::downgrade(&self.registry),
            released: AtomicBool::new(false),
        })
    }
}

/// Live registration of one handler; released on `unsubscribe` or drop
pub struct SubscriptionHandle {
    channel: String,
    id: u64,
    registry: Weak<Mutex<Registry>>,
    released: AtomicBool,
}

impl SubscriptionHandle {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Remove the handler; no callback runs after this returns. Idempotent.
    pub fn unsubscribe(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(registry) = self.registry.upgrade() {
            let mut guard = lock(&registry);
            if let Some(handlers) = guard.channels.get_mut(&self.channel) {
                handlers.retain(|(id, _)| *id != self.id);
            }
        }

        tracing::debug!("unsubscribed from {} (id {})", self.channel, self.id);
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
