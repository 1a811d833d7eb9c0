//! # Binding Event Bus
//!
//! Side channel for binding lifecycle transitions, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! `bind()` never reports hook failures to its caller. Besides logging them,
//! bindings publish a [`BindingEvent::BindFailed`] here so management tooling
//! and tests can react without scraping logs.
//!
//! ```text
//! ┌──────────┐  emit   ┌───────────┐  subscribe  ┌─────────────────┐
//! │ Binding  ├────────>│ EventBus  ├────────────>│ health endpoint │
//! └──────────┘         │ (broadcast│             └─────────────────┘
//! ┌──────────┐  emit   │  channel) │  subscribe  ┌─────────────────┐
//! │ Binding  ├────────>│           ├────────────>│ test assertions │
//! └──────────┘         └───────────┘             └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{BindingEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(BindingEvent::Bound {
//!     binding_id: "b-1".to_string(),
//!     name: "orders-in".to_string(),
//!     group: Some("billing".to_string()),
//! })
//! .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.binding_name(), "orders-in");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Emitting with no subscribers returns `Err(SendError)`; publishers ignore
//! it. Slow subscribers receive `RecvError::Lagged(n)` and may keep reading.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default per-subscriber buffer.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Lifecycle transition of a single binding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BindingEvent {
    /// Binding reached the bound state with a clean `after_bind` hook.
    Bound {
        binding_id: String,
        name: String,
        group: Option<String>,
    },
    /// `after_bind` failed; the binding is bound anyway.
    BindFailed {
        binding_id: String,
        name: String,
        message: String,
    },
    /// Component stopped and `after_unbind` completed.
    Unbound { binding_id: String, name: String },
    /// Teardown finished with an error; the binding is unbound anyway.
    UnbindFailed {
        binding_id: String,
        name: String,
        message: String,
    },
}

impl BindingEvent {
    pub fn binding_id(&self) -> &str {
        match self {
            BindingEvent::Bound { binding_id, .. }
            | BindingEvent::BindFailed { binding_id, .. }
            | BindingEvent::Unbound { binding_id, .. }
            | BindingEvent::UnbindFailed { binding_id, .. } => binding_id,
        }
    }

    pub fn binding_name(&self) -> &str {
        match self {
            BindingEvent::Bound { name, .. }
            | BindingEvent::BindFailed { name, .. }
            | BindingEvent::Unbound { name, .. }
            | BindingEvent::UnbindFailed { name, .. } => name,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BindingEvent::Bound { .. } => "Binding bound",
            BindingEvent::BindFailed { .. } => "Binding bound with a failed setup hook",
            BindingEvent::Unbound { .. } => "Binding unbound",
            BindingEvent::UnbindFailed { .. } => "Binding unbound with teardown errors",
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            BindingEvent::Bound { .. } | BindingEvent::Unbound { .. } => EventSeverity::Info,
            BindingEvent::BindFailed { .. } => EventSeverity::Warning,
            BindingEvent::UnbindFailed { .. } => EventSeverity::Error,
        }
    }
}

/// Event severity levels for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Broadcast bus for [`BindingEvent`]s.
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BindingEvent>,
}

impl EventBus {
    /// Creates a bus buffering at most `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`RuntimeConfig`](crate::config::RuntimeConfig)
    /// validation rejects that before a bus is ever built from it.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes to every current subscriber and returns how many there were.
    pub fn emit(&self, event: BindingEvent) -> Result<usize, SendError<BindingEvent>> {
        self.sender.send(event)
    }

    /// New receiver for events published from now on.
    pub fn subscribe(&self) -> Receiver<BindingEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&BindingEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events rejected by a predicate.
///
/// ```rust
/// use core_runtime::events::{BindingEvent, EventBus, EventSeverity, EventStream};
///
/// let bus = EventBus::default();
/// let failures = EventStream::new(bus.subscribe())
///     .filter(|event| event.severity() >= EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<BindingEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<BindingEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&BindingEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Waits for the next event accepted by the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` when `n` events were dropped for this receiver,
    /// `RecvError::Closed` once every bus handle is gone.
    pub async fn recv(&mut self) -> Result<BindingEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv). `None` means nothing
    /// matching is buffered right now.
    pub fn try_recv(&mut self) -> Option<Result<BindingEvent, RecvError>> {
        use broadcast::error::TryRecvError;

        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(n)) => return Some(Err(RecvError::Lagged(n))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    fn accepts(&self, event: &BindingEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
