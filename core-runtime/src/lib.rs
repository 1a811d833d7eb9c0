//! # Core Runtime Module
//!
//! Ambient runtime infrastructure shared by the binding crates:
//! - Logging and tracing initialization
//! - Runtime configuration with fail-fast validation
//! - Binding event bus
//!
//! ## Overview
//!
//! Nothing in here knows what a binding is. `core-binding` publishes
//! [`BindingEvent`](events::BindingEvent)s onto the bus, reads its clock and
//! timeouts from [`RuntimeConfig`](config::RuntimeConfig), and logs through
//! `tracing`; this crate wires those concerns for the host.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{RuntimeConfig, RuntimeConfigBuilder};
pub use error::{Error, Result};
pub use events::{BindingEvent, EventBus, EventSeverity, EventStream};
