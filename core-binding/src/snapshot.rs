//! Identity and read-only views of a binding for management tooling.

use crate::state::BindingState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a binding instance.
///
/// Two bindings for the same channel name (say, before and after a rebind)
/// have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingId(Uuid);

impl BindingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BindingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BindingId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Setup failure swallowed by `bind()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindFailure {
    /// Error chain rendered as `outer: inner: root`
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl BindFailure {
    pub(crate) fn from_error(error: &anyhow::Error, occurred_at: DateTime<Utc>) -> Self {
        Self {
            message: format!("{:#}", error),
            occurred_at,
        }
    }
}

/// Point-in-time view of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSnapshot {
    pub id: BindingId,
    pub name: String,
    pub group: Option<String>,
    pub state: BindingState,
    /// Consumer-side binding
    pub input: bool,
    pub running: bool,
    pub destination: Option<String>,
    pub component: Option<String>,
    pub bind_failure: Option<BindFailure>,
    pub bound_at: Option<DateTime<Utc>>,
    pub unbound_at: Option<DateTime<Utc>>,
}

impl BindingSnapshot {
    /// Bound and its setup hook reported no failure.
    pub fn is_healthy(&self) -> bool {
        self.state == BindingState::Bound && self.bind_failure.is_none()
    }
}
