//! # Binding Registry
//!
//! Owns every binding a host created and drives them as a group: bring-up in
//! registration order, shutdown in reverse order.
//!
//! Bindings built through [`BindingRegistry::binding`] share the registry's
//! clock and event bus, so one subscriber sees every transition.
//!
//! ## Shutdown semantics
//!
//! [`unbind_all`](BindingRegistry::unbind_all) never stops at the first
//! failure. Each binding gets its own attempt, bounded by
//! [`RuntimeConfig::unbind_timeout`] when one is configured, and the outcome
//! of every attempt lands in the returned [`UnbindReport`]. Bindings that were
//! never bound are torn down too, since their component may already be
//! running.

use crate::binding::{Binding, BindingBuilder};
use crate::error::{BindingError, Result};
use crate::snapshot::BindingSnapshot;
use crate::state::BindingState;

use core_runtime::config::RuntimeConfig;
use core_runtime::events::{BindingEvent, EventBus, Receiver};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

struct Registered<T> {
    by_name: HashMap<String, Arc<Binding<T>>>,
    order: Vec<String>,
}

impl<T> Default for Registered<T> {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T> Registered<T> {
    fn in_order(&self) -> Vec<Arc<Binding<T>>> {
        self.order
            .iter()
            .filter_map(|name| self.by_name.get(name).cloned())
            .collect()
    }
}

/// Outcome of [`BindingRegistry::unbind_all`].
#[derive(Debug, Default)]
pub struct UnbindReport {
    /// Bindings that unbound cleanly, including ones already unbound.
    pub unbound: Vec<String>,
    /// Bindings whose teardown failed or timed out.
    pub failed: Vec<(String, BindingError)>,
}

impl UnbindReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failed bindings whose component may still hold broker resources.
    pub fn leaked(&self) -> impl Iterator<Item = &str> {
        self.failed
            .iter()
            .filter(|(_, err)| err.may_leak())
            .map(|(name, _)| name.as_str())
    }
}

/// Named collection of bindings sharing one runtime configuration.
pub struct BindingRegistry<T> {
    config: RuntimeConfig,
    events: Option<EventBus>,
    bindings: RwLock<Registered<T>>,
}

impl<T> BindingRegistry<T> {
    pub fn new(config: RuntimeConfig) -> Self {
        let events = config.event_bus();
        Self {
            config,
            events,
            bindings: RwLock::new(Registered::default()),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Shared event bus; `None` when events are disabled.
    pub fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    pub fn subscribe(&self) -> Option<Receiver<BindingEvent>> {
        self.events.as_ref().map(EventBus::subscribe)
    }

    /// Builder pre-wired with this registry's clock and event bus.
    pub fn binding(&self, name: impl Into<String>) -> BindingBuilder<T> {
        let builder = Binding::builder(name).runtime(&self.config);
        match &self.events {
            Some(bus) => builder.events(bus.clone()),
            None => builder,
        }
    }

    /// Adds a binding under its name.
    ///
    /// # Errors
    ///
    /// [`BindingError::DuplicateBinding`] if the name is taken.
    pub async fn register(&self, binding: Binding<T>) -> Result<Arc<Binding<T>>> {
        let mut bindings = self.bindings.write().await;
        let name = binding.name().to_string();
        if bindings.by_name.contains_key(&name) {
            return Err(BindingError::DuplicateBinding(name));
        }

        let binding = Arc::new(binding);
        bindings.by_name.insert(name.clone(), Arc::clone(&binding));
        bindings.order.push(name.clone());
        info!(binding = %name, "Registered binding");
        Ok(binding)
    }

    pub async fn get(&self, name: &str) -> Option<Arc<Binding<T>>> {
        self.bindings.read().await.by_name.get(name).cloned()
    }

    /// Names in registration order.
    pub async fn names(&self) -> Vec<String> {
        self.bindings.read().await.order.clone()
    }

    pub async fn len(&self) -> usize {
        self.bindings.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes a binding without unbinding it; the caller takes over.
    ///
    /// # Errors
    ///
    /// [`BindingError::NotFound`] for an unknown name.
    pub async fn remove(&self, name: &str) -> Result<Arc<Binding<T>>> {
        let mut bindings = self.bindings.write().await;
        let binding = bindings
            .by_name
            .remove(name)
            .ok_or_else(|| BindingError::NotFound(name.to_string()))?;
        bindings.order.retain(|n| n != name);
        debug!(binding = %name, state = %binding.state(), "Removed binding");
        Ok(binding)
    }

    pub async fn snapshots(&self) -> Vec<BindingSnapshot> {
        self.bindings
            .read()
            .await
            .in_order()
            .iter()
            .map(|binding| binding.snapshot())
            .collect()
    }

    /// Binds every `Created` binding in registration order.
    ///
    /// Returns the names whose `after_bind` hook failed. Those bindings are
    /// bound all the same.
    #[instrument(skip(self))]
    pub async fn bind_all(&self) -> Vec<String> {
        let pending = self.bindings.read().await.in_order();
        let mut degraded = Vec::new();

        for binding in pending {
            if binding.state() != BindingState::Created {
                continue;
            }
            binding.bind().await;
            if binding.bind_failure().is_some() {
                degraded.push(binding.name().to_string());
            }
        }

        if degraded.is_empty() {
            info!("All bindings bound");
        } else {
            warn!(degraded = ?degraded, "Some bindings bound without their setup hook");
        }
        degraded
    }

    /// Unbinds every binding in reverse registration order, bound or not.
    #[instrument(skip(self))]
    pub async fn unbind_all(&self) -> UnbindReport {
        let mut bindings = self.bindings.read().await.in_order();
        bindings.reverse();
        let mut report = UnbindReport::default();

        for binding in bindings {
            let name = binding.name().to_string();
            if binding.state() == BindingState::Created {
                debug!(binding = %name, "Tearing down binding that was never bound");
            }

            let result = match self.config.unbind_timeout {
                Some(timeout) => binding.unbind_within(timeout).await,
                None => binding.unbind().await,
            };
            match result {
                Ok(()) => report.unbound.push(name),
                Err(err) => {
                    warn!(binding = %name, error = %err, "Unbind failed; continuing shutdown");
                    report.failed.push((name, err));
                }
            }
        }

        info!(
            unbound = report.unbound.len(),
            failed = report.failed.len(),
            "Shutdown of bindings finished"
        );
        report
    }
}

impl<T> Default for BindingRegistry<T> {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl<T> std::fmt::Debug for BindingRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
