use binder_traits::ComponentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindingError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state transition for binding {name} from {from} to {to}")]
    InvalidStateTransition {
        name: String,
        from: String,
        to: String,
    },

    #[error("Binding {name}: component failed to stop: {source}")]
    ComponentStop {
        name: String,
        #[source]
        source: ComponentError,
    },

    #[error("Binding {name}: unbind hook failed: {source}")]
    UnbindHook {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Binding {name}: component failed to stop ({stop}) and unbind hook failed ({hook})")]
    Teardown {
        name: String,
        stop: ComponentError,
        hook: anyhow::Error,
    },

    #[error("Binding {name} did not unbind within {timeout_ms} ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("Binding {0} is already registered")]
    DuplicateBinding(String),

    #[error("Binding {0} not found")]
    NotFound(String),
}

impl BindingError {
    /// Name of the binding the error concerns, when there is one.
    pub fn binding_name(&self) -> Option<&str> {
        match self {
            BindingError::InvalidArgument(_) => None,
            BindingError::InvalidStateTransition { name, .. }
            | BindingError::ComponentStop { name, .. }
            | BindingError::UnbindHook { name, .. }
            | BindingError::Teardown { name, .. }
            | BindingError::Timeout { name, .. } => Some(name),
            BindingError::DuplicateBinding(name) | BindingError::NotFound(name) => Some(name),
        }
    }

    /// Whether teardown left the component possibly holding broker resources.
    pub fn may_leak(&self) -> bool {
        matches!(
            self,
            BindingError::ComponentStop { .. }
                | BindingError::Teardown { .. }
                | BindingError::Timeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BindingError>;
