//! # Binding
//!
//! Live handle for one channel-to-destination association.
//!
//! ## Overview
//!
//! A binder builds a [`Binding`] right after provisioning succeeds, calls
//! [`bind`](Binding::bind), and hands it to the application. The application
//! (or the framework on shutdown) later calls [`unbind`](Binding::unbind)
//! once to release everything.
//!
//! ```text
//! Created ──bind()──> Bound ──unbind()──> Unbound
//!    │       │                  │            ▲
//!    │       └ after_bind       ├ component.stop()
//!    │         (fail-soft)      └ after_unbind
//!    └──────────────unbind()─────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - `bind()` never fails visibly. A failing `after_bind` hook is logged,
//!   recorded ([`Binding::bind_failure`]) and published as
//!   [`BindingEvent::BindFailed`]; the binding is bound regardless.
//! - `unbind()` stops the component before running `after_unbind`, stops it
//!   exactly once (also across a timed-out and retried unbind), and leaves the
//!   binding unbound even when either step fails. A binding that was never
//!   bound is torn down the same way.
//! - A second `unbind()` is a no-op returning `Ok(())`. Concurrent callers are
//!   serialized, so the component is never stopped twice.
//!
//! ## Usage
//!
//! ```ignore
//! use core_binding::{Binding, DestinationDescriptor, StaticConsumerDestination};
//!
//! let binding = Binding::builder("orders-in")
//!     .group("billing")
//!     .target(channel)
//!     .component(consumer_loop)
//!     .destination(DestinationDescriptor::consumer(StaticConsumerDestination::new("orders")))
//!     .hooks(Arc::new(ListenerRegistration::new(container)))
//!     .build()?;
//!
//! binding.bind().await;
//! // ...
//! binding.unbind().await?;
//! ```

use crate::destination::DestinationDescriptor;
use crate::error::{BindingError, Result};
use crate::hooks::{BindingHooks, BindingInfo, NoopHooks};
use crate::snapshot::{BindFailure, BindingId, BindingSnapshot};
use crate::state::BindingState;

use binder_traits::{describe_component, Clock, ComponentError, Lifecycle, SystemClock};
use chrono::{DateTime, Utc};
use core_runtime::config::RuntimeConfig;
use core_runtime::events::{BindingEvent, EventBus};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Mutable part of a binding. Only held for short, non-async sections.
#[derive(Debug, Default)]
struct Status {
    state: BindingState,
    bind_failure: Option<BindFailure>,
    bound_at: Option<DateTime<Utc>>,
    unbound_at: Option<DateTime<Utc>>,
    // Set once `stop()` has returned, so an interrupted unbind never stops twice.
    component_stopped: bool,
    stop_error: Option<ComponentError>,
}

/// Association between a binding target of type `T` and a provisioned
/// destination, with an optional runtime component to stop on teardown.
pub struct Binding<T> {
    id: BindingId,
    info: BindingInfo,
    target: T,
    component: Option<Arc<dyn Lifecycle>>,
    hooks: Arc<dyn BindingHooks>,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
    // Serializes bind/unbind so a transition is never observed half-done.
    transition: tokio::sync::Mutex<()>,
    status: Mutex<Status>,
}

impl<T> Binding<T> {
    /// Creates a binding in the `Created` state with no-op hooks.
    ///
    /// `group` may be empty for producer bindings.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidArgument`] when `target` is `None`.
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        target: Option<T>,
        component: Option<Arc<dyn Lifecycle>>,
        destination: Option<DestinationDescriptor>,
    ) -> Result<Self> {
        let mut builder = Self::builder(name).group(group);
        if let Some(target) = target {
            builder = builder.target(target);
        }
        if let Some(component) = component {
            builder = builder.component(component);
        }
        if let Some(destination) = destination {
            builder = builder.destination(destination);
        }
        builder.build()
    }

    pub fn builder(name: impl Into<String>) -> BindingBuilder<T> {
        BindingBuilder::new(name)
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    /// Consumer group; `None` for producer bindings.
    pub fn group(&self) -> Option<&str> {
        self.info.group()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// The descriptor exactly as supplied at construction.
    pub fn destination(&self) -> Option<&DestinationDescriptor> {
        self.info.destination()
    }

    pub fn component(&self) -> Option<&Arc<dyn Lifecycle>> {
        self.component.as_ref()
    }

    pub fn info(&self) -> &BindingInfo {
        &self.info
    }

    pub fn state(&self) -> BindingState {
        self.status().state
    }

    /// Whether this is a consumer-side binding.
    ///
    /// Decided by the destination when there is one, by the presence of a
    /// group otherwise.
    pub fn is_input(&self) -> bool {
        match self.destination() {
            Some(destination) => destination.is_consumer(),
            None => self.group().is_some(),
        }
    }

    /// Bound, and the component (if any) reports itself running.
    pub fn is_running(&self) -> bool {
        self.running_in(self.state())
    }

    /// Failure swallowed by [`bind`](Self::bind), if its hook failed.
    pub fn bind_failure(&self) -> Option<BindFailure> {
        self.status().bind_failure.clone()
    }

    pub fn bound_at(&self) -> Option<DateTime<Utc>> {
        self.status().bound_at
    }

    pub fn unbound_at(&self) -> Option<DateTime<Utc>> {
        self.status().unbound_at
    }

    pub fn snapshot(&self) -> BindingSnapshot {
        let status = self.status();
        BindingSnapshot {
            id: self.id,
            name: self.name().to_string(),
            group: self.group().map(str::to_string),
            state: status.state,
            input: self.is_input(),
            running: self.running_in(status.state),
            destination: self.destination().map(|d| d.name().to_string()),
            component: self.component.as_deref().map(|c| describe_component(Some(c))),
            bind_failure: status.bind_failure.clone(),
            bound_at: status.bound_at,
            unbound_at: status.unbound_at,
        }
    }

    /// Moves the binding to `Bound`, running the `after_bind` hook.
    ///
    /// Hook failures are logged, recorded and published, never returned: bulk
    /// bring-up must not stall because one binding's setup misbehaved. Calling
    /// this on a binding that is not `Created` logs a warning and does nothing.
    pub async fn bind(&self) {
        let _transition = self.transition.lock().await;

        let current = self.state();
        if let Err(err) = current.validate_transition(self.name(), BindingState::Bound) {
            warn!(binding = %self.name(), state = %current, "Ignoring bind(): {}", err);
            return;
        }

        let failure = match self.hooks.after_bind(&self.info).await {
            Ok(()) => None,
            Err(err) => {
                error!(
                    binding = %self.name(),
                    group = self.group().unwrap_or(""),
                    error = %format!("{:#}", err),
                    "after_bind hook failed; binding is bound without it"
                );
                Some(BindFailure::from_error(&err, self.clock.now()))
            }
        };

        {
            let mut status = self.status();
            status.state = BindingState::Bound;
            status.bound_at = Some(self.clock.now());
            status.bind_failure = failure.clone();
        }

        let event = match failure {
            Some(failure) => BindingEvent::BindFailed {
                binding_id: self.id.to_string(),
                name: self.name().to_string(),
                message: failure.message,
            },
            None => BindingEvent::Bound {
                binding_id: self.id.to_string(),
                name: self.name().to_string(),
                group: self.group().map(str::to_string),
            },
        };
        self.publish(event);

        debug!(binding = %self.name(), "Binding bound");
    }

    /// Stops the component, runs `after_unbind`, and moves to `Unbound`.
    ///
    /// Works from `Created` as well as `Bound`: the component is typically
    /// running before the binding is ever bound, and must be stopped either
    /// way. The binding ends up `Unbound` even when stopping or the hook
    /// fails; the failure is returned so shutdown sequences can tell teardown
    /// was incomplete. Calling it again once unbound is a no-op.
    ///
    /// # Errors
    ///
    /// - [`BindingError::ComponentStop`] if the component failed to stop
    /// - [`BindingError::UnbindHook`] if `after_unbind` failed
    /// - [`BindingError::Teardown`] if both failed
    pub async fn unbind(&self) -> Result<()> {
        let _transition = self.transition.lock().await;

        let current = self.state();
        if current == BindingState::Unbound {
            debug!(binding = %self.name(), "Binding already unbound; nothing to do");
            return Ok(());
        }
        current.validate_transition(self.name(), BindingState::Unbound)?;

        let already_stopped = self.status().component_stopped;
        if already_stopped {
            debug!(binding = %self.name(), "Component stopped by an interrupted unbind; not stopping again");
        } else {
            let stopped = match &self.component {
                Some(component) => component.stop().await,
                None => Ok(()),
            };
            if let Err(err) = &stopped {
                error!(binding = %self.name(), error = %err, "Component failed to stop");
            }
            let mut status = self.status();
            status.component_stopped = true;
            status.stop_error = stopped.err();
        }

        let cleaned_up = self.hooks.after_unbind(&self.info).await;

        let stop_error = {
            let mut status = self.status();
            status.state = BindingState::Unbound;
            status.unbound_at = Some(self.clock.now());
            status.stop_error.take()
        };

        let name = self.name().to_string();
        let outcome = match (stop_error, cleaned_up) {
            (None, Ok(())) => Ok(()),
            (Some(source), Ok(())) => Err(BindingError::ComponentStop { name, source }),
            (None, Err(source)) => Err(BindingError::UnbindHook { name, source }),
            (Some(stop), Err(hook)) => Err(BindingError::Teardown { name, stop, hook }),
        };

        let event = match &outcome {
            Ok(()) => BindingEvent::Unbound {
                binding_id: self.id.to_string(),
                name: self.name().to_string(),
            },
            Err(err) => BindingEvent::UnbindFailed {
                binding_id: self.id.to_string(),
                name: self.name().to_string(),
                message: err.to_string(),
            },
        };
        self.publish(event);

        debug!(binding = %self.name(), ok = outcome.is_ok(), "Binding unbound");
        outcome
    }

    /// [`unbind`](Self::unbind) with a deadline.
    ///
    /// When the deadline passes the in-flight teardown is dropped and the
    /// binding keeps its state, so the call can be retried. If the component
    /// had already stopped, the retry skips straight to `after_unbind` and
    /// still reports the stop outcome.
    ///
    /// # Errors
    ///
    /// [`BindingError::Timeout`] on expiry, otherwise whatever `unbind` returns.
    pub async fn unbind_within(&self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.unbind()).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = saturating_millis(timeout);
                warn!(binding = %self.name(), timeout_ms, "Unbind timed out");
                Err(BindingError::Timeout {
                    name: self.name().to_string(),
                    timeout_ms,
                })
            }
        }
    }

    fn running_in(&self, state: BindingState) -> bool {
        state == BindingState::Bound && self.component.as_ref().map_or(true, |c| c.is_running())
    }

    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: BindingEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is fine.
            bus.emit(event).ok();
        }
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl<T: fmt::Debug> fmt::Display for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Binding [name={}, target={:?}, lifecycle={}]",
            self.name(),
            self.target,
            describe_component(self.component.as_deref())
        )
    }
}

impl<T: fmt::Debug> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("group", &self.group())
            .field("state", &self.state())
            .field("target", &self.target)
            .field("destination", &self.destination())
            .field("component", &self.component)
            .field("hooks", &"BindingHooks { ... }")
            .finish()
    }
}

/// Builder for [`Binding`].
pub struct BindingBuilder<T> {
    name: String,
    group: Option<String>,
    target: Option<T>,
    component: Option<Arc<dyn Lifecycle>>,
    destination: Option<DestinationDescriptor>,
    hooks: Option<Arc<dyn BindingHooks>>,
    clock: Option<Arc<dyn Clock>>,
    events: Option<EventBus>,
}

impl<T> BindingBuilder<T> {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            target: None,
            component: None,
            destination: None,
            hooks: None,
            clock: None,
            events: None,
        }
    }

    /// Consumer group. Empty strings are treated as no group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// The binding target. Required.
    pub fn target(mut self, target: T) -> Self {
        self.target = Some(target);
        self
    }

    pub fn component(mut self, component: Arc<dyn Lifecycle>) -> Self {
        self.component = Some(component);
        self
    }

    pub fn destination(mut self, destination: DestinationDescriptor) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Direction-specific hooks; defaults to [`NoopHooks`].
    pub fn hooks(mut self, hooks: Arc<dyn BindingHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Clock for transition timestamps; defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Bus receiving this binding's lifecycle events.
    pub fn events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Takes the clock from a runtime configuration.
    pub fn runtime(self, config: &RuntimeConfig) -> Self {
        self.clock(Arc::clone(&config.clock))
    }

    /// # Errors
    ///
    /// [`BindingError::InvalidArgument`] when no target was given.
    pub fn build(self) -> Result<Binding<T>> {
        let target = self.target.ok_or_else(|| {
            BindingError::InvalidArgument(format!(
                "binding '{}' requires a target. Use .target() to set it.",
                self.name
            ))
        })?;

        Ok(Binding {
            id: BindingId::new(),
            info: BindingInfo::new(self.name, self.group, self.destination),
            target,
            component: self.component,
            hooks: self.hooks.unwrap_or_else(|| Arc::new(NoopHooks)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            events: self.events,
            transition: tokio::sync::Mutex::new(()),
            status: Mutex::new(Status::default()),
        })
    }
}
