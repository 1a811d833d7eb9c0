//! # Direction-specific Binding Hooks
//!
//! Consumer and producer bindings differ only in what they do right after
//! binding and right after unbinding: a consumer binding might register its
//! poll loop with a listener container, a producer binding might flush and
//! deregister a partition handler. That behavior is injected as a
//! [`BindingHooks`] strategy instead of being baked into the binding.
//!
//! ## Failure policy
//!
//! | Hook           | On error                                                     |
//! |----------------|--------------------------------------------------------------|
//! | `after_bind`   | logged, recorded on the binding, published; binding is bound |
//! | `after_unbind` | returned from `unbind()`; binding is unbound anyway          |

use crate::destination::DestinationDescriptor;
use async_trait::async_trait;

/// Immutable identity of a binding, as seen by its hooks.
#[derive(Debug, Clone)]
pub struct BindingInfo {
    name: String,
    group: Option<String>,
    destination: Option<DestinationDescriptor>,
}

impl BindingInfo {
    pub(crate) fn new(
        name: String,
        group: Option<String>,
        destination: Option<DestinationDescriptor>,
    ) -> Self {
        // Producer bindings conventionally pass "" for the group.
        let group = group.filter(|g| !g.is_empty());
        Self {
            name,
            group,
            destination,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn destination(&self) -> Option<&DestinationDescriptor> {
        self.destination.as_ref()
    }
}

/// Setup and cleanup logic specific to one binding direction.
///
/// Both hooks default to doing nothing.
///
/// # Example
///
/// ```ignore
/// use core_binding::{BindingHooks, BindingInfo};
///
/// struct ListenerRegistration {
///     container: Arc<ListenerContainer>,
/// }
///
/// #[async_trait::async_trait]
/// impl BindingHooks for ListenerRegistration {
///     async fn after_bind(&self, info: &BindingInfo) -> anyhow::Result<()> {
///         self.container.register(info.name(), info.group()).await
///     }
///
///     async fn after_unbind(&self, info: &BindingInfo) -> anyhow::Result<()> {
///         self.container.deregister(info.name()).await
///     }
/// }
/// ```
#[async_trait]
pub trait BindingHooks: Send + Sync {
    /// Runs once, when the binding moves to bound.
    async fn after_bind(&self, _info: &BindingInfo) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs once, after the component has been stopped.
    async fn after_unbind(&self, _info: &BindingInfo) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl BindingHooks for NoopHooks {}
