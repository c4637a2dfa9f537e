//! Typed event names layered over the JSON bus.

use crate::bus::{EventBus, EventSink, Listener};
use crate::error::{BusError, BusResult};
use raptor_core::GraphNode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use tracing::warn;

/// Ask the chat view to highlight a span of text.
pub const HIGHLIGHT_TEXT: &str = "highlight-text";
/// Ask the graph view to highlight a node.
pub const HIGHLIGHT_NODE: &str = "highlight-node";

pub const HIGHLIGHT_TEXT_TOPIC: Topic<TextHighlight> = Topic::new(HIGHLIGHT_TEXT);
pub const HIGHLIGHT_NODE_TOPIC: Topic<NodeHighlight> = Topic::new(HIGHLIGHT_NODE);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextHighlight {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHighlight {
    pub id: String,
}

impl From<&GraphNode> for NodeHighlight {
    fn from(node: &GraphNode) -> Self {
        Self {
            id: node.id.clone(),
        }
    }
}

static NULL: Value = Value::Null;

/// An event name bound to the payload type its listeners expect.
pub struct Topic<T> {
    name: &'static str,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Topic<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _payload: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Topic<T> {}

impl<T> fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Topic").field(&self.name).finish()
    }
}

impl<T: Serialize> Topic<T> {
    pub fn emit(&self, sink: &dyn EventSink, payload: &T) -> BusResult<()> {
        let value = serde_json::to_value(payload).map_err(|source| BusError::Encode {
            event: self.name,
            source,
        })?;
        sink.emit(self.name, Some(value));
        Ok(())
    }
}

impl<T: DeserializeOwned + 'static> Topic<T> {
    /// Registers `handler` for this topic. Dispatches whose payload does not
    /// decode into `T` are logged and skipped; an absent payload decodes as
    /// JSON `null`.
    pub fn subscribe<F>(&self, bus: &EventBus, handler: F) -> Listener
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let name = self.name;
        bus.on_fn(name, move |event| {
            let value = event.payload.as_ref().unwrap_or(&NULL);
            match T::deserialize(value) {
                Ok(payload) => handler(payload),
                Err(err) => warn!(
                    event = name,
                    error = %err,
                    "payload does not match topic, skipping"
                ),
            }
        })
    }
}

impl EventBus {
    pub fn emit_topic<T: Serialize>(&self, topic: Topic<T>, payload: &T) -> BusResult<()> {
        topic.emit(self, payload)
    }

    pub fn on_topic<T, F>(&self, topic: Topic<T>, handler: F) -> Listener
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        topic.subscribe(self, handler)
    }
}
