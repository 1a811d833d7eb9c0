//! Controllable Runtime Components
//!
//! A binder usually pairs every binding with a runtime component that moves
//! messages: a consumer poll loop, a producer flush task, a partition
//! listener. The binding never creates that component, but it is responsible
//! for stopping it when the binding is torn down.

use std::fmt;

use crate::error::Result;

/// Lifecycle capability of a controllable component.
///
/// Implementations must tolerate concurrent calls to [`is_running`] while a
/// [`stop`] is in flight. Whether a repeated `stop` is safe is up to the
/// implementation; bindings guarantee they call it at most once.
///
/// # Example
///
/// ```ignore
/// use binder_traits::lifecycle::Lifecycle;
///
/// async fn restart(component: &dyn Lifecycle) -> binder_traits::error::Result<()> {
///     if component.is_running() {
///         component.stop().await?;
///     }
///     component.start().await
/// }
/// ```
///
/// [`is_running`]: Lifecycle::is_running
/// [`stop`]: Lifecycle::stop
#[async_trait::async_trait]
pub trait Lifecycle: fmt::Debug + Send + Sync {
    /// Start the component.
    async fn start(&self) -> Result<()>;

    /// Stop the component, releasing whatever it holds on the destination.
    async fn stop(&self) -> Result<()>;

    /// Whether the component is currently running.
    fn is_running(&self) -> bool;

    /// Stable component name used in diagnostics.
    ///
    /// Components without a meaningful name return `None`, in which case
    /// callers fall back to the `Debug` representation.
    fn component_name(&self) -> Option<String> {
        None
    }
}

/// Render a component for diagnostics: its name when it has one, its
/// `Debug` form otherwise, and `null` when there is no component at all.
pub fn describe_component(component: Option<&dyn Lifecycle>) -> String {
    match component {
        Some(component) => component
            .component_name()
            .unwrap_or_else(|| format!("{:?}", component)),
        None => "null".to_string(),
    }
}
