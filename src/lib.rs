//! Workspace facade crate.
//!
//! Re-exports the binding crates so a host binder can depend on
//! `stream-binding-workspace` alone instead of wiring `core-binding`,
//! `core-runtime` and `binder-traits` individually.

pub use binder_traits;
pub use core_binding;
pub use core_runtime;

pub use core_binding::{
    Binding, BindingError, BindingHooks, BindingInfo, BindingRegistry, BindingState,
    DestinationDescriptor,
};
pub use core_runtime::config::RuntimeConfig;
pub use core_runtime::logging::{init_logging, LoggingConfig};
