//! # Core Binding
//!
//! Lifecycle handle for a logical message channel attached to a provisioned
//! broker destination.
//!
//! ## Overview
//!
//! A binder creates a [`Binding`] after it has provisioned a destination and
//! wired a target (usually a channel) to it. The binding then:
//! - runs direction-specific setup once bound ([`BindingHooks::after_bind`]),
//!   without ever failing the caller
//! - stops its runtime component and runs cleanup on [`Binding::unbind`],
//!   component first, exactly once
//! - exposes its identity, destination and state for diagnostics
//!
//! [`BindingRegistry`] groups bindings for ordered bring-up and best-effort
//! shutdown.
//!
//! ## Example
//!
//! ```ignore
//! use core_binding::{Binding, DestinationDescriptor, StaticProducerDestination};
//!
//! let binding = Binding::new(
//!     "orders-out",
//!     "",
//!     Some(channel),
//!     None,
//!     Some(DestinationDescriptor::producer(StaticProducerDestination::new("orders"))),
//! )?;
//!
//! binding.bind().await;
//! assert!(!binding.is_input());
//! binding.unbind().await?;
//! ```

pub mod binding;
pub mod destination;
pub mod error;
pub mod hooks;
pub mod registry;
pub mod snapshot;
pub mod state;

pub use binding::{Binding, BindingBuilder};
pub use destination::{DestinationDescriptor, StaticConsumerDestination, StaticProducerDestination};
pub use error::{BindingError, Result};
pub use hooks::{BindingHooks, BindingInfo, NoopHooks};
pub use registry::{BindingRegistry, UnbindReport};
pub use snapshot::{BindFailure, BindingId, BindingSnapshot};
pub use state::BindingState;
