use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("Component {component} failed to start: {message}")]
    StartFailed { component: String, message: String },

    #[error("Component {component} failed to stop: {message}")]
    StopFailed { component: String, message: String },

    #[error("Log sink rejected entry: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComponentError {
    pub fn start_failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StartFailed {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn stop_failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StopFailed {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ComponentError>;
