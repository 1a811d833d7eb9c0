//! # Binding State Machine
//!
//! ```text
//! Created ──bind()──> Bound ──unbind()──> Unbound
//!    └───────────────unbind()───────────────┘
//! ```
//!
//! No transition leads back to an earlier state and `Unbound` is terminal.
//! Unbinding straight from `Created` still tears the component down.

use crate::error::{BindingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BindingState {
    /// Constructed, `bind()` not yet called
    #[default]
    Created,
    /// `bind()` completed, whatever its hook reported
    Bound,
    /// `unbind()` completed; terminal
    Unbound,
}

impl BindingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingState::Created => "created",
            BindingState::Bound => "bound",
            BindingState::Unbound => "unbound",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BindingState::Unbound)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: BindingState) -> bool {
        matches!(
            (self, next),
            (BindingState::Created, BindingState::Bound)
                | (BindingState::Created, BindingState::Unbound)
                | (BindingState::Bound, BindingState::Unbound)
        )
    }

    /// Validates `self -> next` for the named binding.
    ///
    /// # Errors
    ///
    /// [`BindingError::InvalidStateTransition`] for anything going backwards
    /// or out of `Unbound`.
    pub fn validate_transition(&self, name: &str, next: BindingState) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(BindingError::InvalidStateTransition {
                name: name.to_string(),
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl FromStr for BindingState {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "created" => Ok(BindingState::Created),
            "bound" => Ok(BindingState::Bound),
            "unbound" => Ok(BindingState::Unbound),
            _ => Err(BindingError::InvalidArgument(format!(
                "unknown binding state '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for BindingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
