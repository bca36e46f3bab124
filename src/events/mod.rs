//! Socket-style event handlers.
//!
//! Controller methods tagged with `on_connect`, `on_disconnect` or `channel` are bound to
//! their controller instance and registered on an [`EventHub`]. A transport (a websocket
//! endpoint, a test harness) feeds connections and messages into the hub.

use crate::component::Instance;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Event name used for new connections.
pub const CONNECTION: &str = "connection";
/// Event name used when a connection closes.
pub const DISCONNECT: &str = "disconnect";

pub type EventFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

pub type EventHandler = Arc<dyn Fn(Instance, SocketContext, Value) -> EventFuture + Send + Sync>;

/// Identifies the connection an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketContext {
    pub id: String,
}

impl SocketContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Clone)]
pub struct EventDescriptor {
    pub event: String,
    pub handler_name: String,
    pub handler: EventHandler,
}

impl fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDescriptor")
            .field("event", &self.event)
            .field("handler_name", &self.handler_name)
            .finish()
    }
}

pub(crate) fn erase_event_handler<T, F, Fut>(f: F) -> EventHandler
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>, SocketContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(
        move |instance: Instance, socket: SocketContext, payload: Value| -> EventFuture {
            match instance.downcast::<T>() {
                Ok(this) => Box::pin(f(this, socket, payload)),
                Err(_) => {
                    tracing::error!(
                        "Event handler instance is not a {}",
                        std::any::type_name::<T>()
                    );
                    Box::pin(async {})
                }
            }
        },
    )
}

/// Decode an event payload, logging and discarding payloads of the wrong shape.
pub fn decode_payload<T: DeserializeOwned>(event: &str, payload: &Value) -> Option<T> {
    match serde_json::from_value(payload.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Dropping '{}' event with malformed payload: {}", event, e);
            None
        }
    }
}

#[derive(Clone)]
struct BoundEvent {
    handler: EventHandler,
    instance: Instance,
}

/// Dispatches socket events to bound controller handlers.
#[derive(Default)]
pub struct EventHub {
    handlers: DashMap<String, Vec<BoundEvent>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` bound to `instance`.
    pub fn install(&self, descriptor: &EventDescriptor, instance: Instance) {
        self.handlers
            .entry(descriptor.event.clone())
            .or_default()
            .push(BoundEvent {
                handler: Arc::clone(&descriptor.handler),
                instance,
            });
    }

    pub async fn connect(&self, socket: &SocketContext) -> usize {
        self.emit(socket, CONNECTION, Value::Null).await
    }

    pub async fn disconnect(&self, socket: &SocketContext) -> usize {
        self.emit(socket, DISCONNECT, Value::Null).await
    }

    /// Run every handler registered for `event`, in binding order.
    ///
    /// Returns the number of handlers invoked.
    pub async fn emit(&self, socket: &SocketContext, event: &str, payload: Value) -> usize {
        // Snapshot so no shard lock is held across the awaits below.
        let bound = match self.handlers.get(event) {
            Some(list) => list.value().clone(),
            None => {
                tracing::debug!("No handler for event '{}'", event);
                return 0;
            }
        };
        for entry in &bound {
            (entry.handler)(Arc::clone(&entry.instance), socket.clone(), payload.clone()).await;
        }
        bound.len()
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, |list| list.len())
    }
}
