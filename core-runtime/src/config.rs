//! # Runtime Configuration
//!
//! Settings shared by every binding a host creates: the clock used for
//! transition timestamps, the event bus sizing, and the optional per-binding
//! teardown deadline applied by bulk shutdown.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::RuntimeConfig;
//! use std::time::Duration;
//!
//! let config = RuntimeConfig::builder()
//!     .event_buffer_size(256)
//!     .unbind_timeout(Duration::from_secs(10))
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.event_buffer_size, 256);
//! ```
//!
//! ## Error Handling
//!
//! `build()` validates eagerly and returns [`Error::Config`] with an
//! actionable message:
//!
//! ```should_panic
//! use core_runtime::config::RuntimeConfig;
//!
//! RuntimeConfig::builder()
//!     .event_buffer_size(0)
//!     .build()
//!     .expect("zero-sized buffers are rejected");
//! ```

use crate::error::{Error, Result};
use crate::events::{EventBus, DEFAULT_EVENT_BUFFER_SIZE};
use binder_traits::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on the per-subscriber event buffer.
pub const MAX_EVENT_BUFFER_SIZE: usize = 65_536;

/// Runtime configuration for bindings.
///
/// Use [`RuntimeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Source of transition timestamps
    pub clock: Arc<dyn Clock>,

    /// Per-subscriber buffer of the binding event bus
    pub event_buffer_size: usize,

    /// Publish binding lifecycle events
    pub enable_events: bool,

    /// Deadline for a single binding's teardown during bulk shutdown.
    /// `None` waits as long as the component takes.
    pub unbind_timeout: Option<Duration>,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("clock", &"Clock { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .field("enable_events", &self.enable_events)
            .field("unbind_timeout", &self.unbind_timeout)
            .finish()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            enable_events: true,
            unbind_timeout: None,
        }
    }
}

impl RuntimeConfig {
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Checks:
    /// - event buffer is within `1..=MAX_EVENT_BUFFER_SIZE`
    /// - unbind timeout, when set, is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size {} exceeds maximum of {}",
                self.event_buffer_size, MAX_EVENT_BUFFER_SIZE
            )));
        }

        if self.unbind_timeout == Some(Duration::ZERO) {
            return Err(Error::Config(
                "Unbind timeout must be non-zero. Omit it to wait without a deadline."
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Event bus sized from this config, or `None` when events are disabled.
    pub fn event_bus(&self) -> Option<EventBus> {
        self.enable_events
            .then(|| EventBus::new(self.event_buffer_size))
    }
}

/// Builder for [`RuntimeConfig`].
#[derive(Default)]
pub struct RuntimeConfigBuilder {
    clock: Option<Arc<dyn Clock>>,
    event_buffer_size: Option<usize>,
    enable_events: Option<bool>,
    unbind_timeout: Option<Duration>,
}

impl RuntimeConfigBuilder {
    /// Inject a clock; defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to [`DEFAULT_EVENT_BUFFER_SIZE`].
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Defaults to `true`.
    pub fn enable_events(mut self, enabled: bool) -> Self {
        self.enable_events = Some(enabled);
        self
    }

    pub fn unbind_timeout(mut self, timeout: Duration) -> Self {
        self.unbind_timeout = Some(timeout);
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] when validation fails.
    pub fn build(self) -> Result<RuntimeConfig> {
        let defaults = RuntimeConfig::default();

        let config = RuntimeConfig {
            clock: self.clock.unwrap_or(defaults.clock),
            event_buffer_size: self.event_buffer_size.unwrap_or(defaults.event_buffer_size),
            enable_events: self.enable_events.unwrap_or(defaults.enable_events),
            unbind_timeout: self.unbind_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}
