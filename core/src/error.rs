// storyflow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Handler missing for non-optional step: {step_name}")]
    HandlerMissing { step_name: String },

    #[error("Error in handler or external operation. Source: {source}")]
    Handler {
        #[source]
        source: AnyhowError,
    },

    #[error("No pipeline registered for context type {type_name}")]
    NotRegistered { type_name: String },

    #[error("Context type mismatch in registry dispatch (expected {expected_type})")]
    TypeMismatch { expected_type: String },

    #[error("Internal flow error: {0}")]
    Internal(String),
}

impl From<AnyhowError> for FlowError {
    fn from(err: AnyhowError) -> Self {
        FlowError::Handler { source: err }
    }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
