//! # Binder Collaborator Traits
//!
//! Capabilities a binding consumes from the rest of the messaging stack.
//!
//! ## Overview
//!
//! A binding sits between three collaborators it does not own:
//!
//! - a **provisioner**, which creates the physical destination on a broker and
//!   hands back a descriptor ([`ConsumerDestination`] / [`ProducerDestination`]),
//! - a **binder**, which builds the runtime component that moves messages and
//!   exposes it through [`Lifecycle`],
//! - the **host**, which supplies a time source ([`Clock`]) and optionally its
//!   own log pipeline ([`LoggerSink`]).
//!
//! This crate only defines the contracts. Concrete brokers, provisioners and
//! transport clients live elsewhere.
//!
//! ## Error Handling
//!
//! Component implementations report failures as
//! [`ComponentError`](error::ComponentError). Bindings surface stop failures to
//! whoever calls `unbind`, since a component that failed to stop may still
//! hold broker resources.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync`; bindings are shared across Tokio tasks
//! behind `Arc`.

pub mod clock;
pub mod destination;
pub mod error;
pub mod lifecycle;
pub mod log;

pub use error::ComponentError;

pub use clock::{Clock, ManualClock, SystemClock};
pub use destination::{ConsumerDestination, Destination, ProducerDestination};
pub use lifecycle::{describe_component, Lifecycle};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
