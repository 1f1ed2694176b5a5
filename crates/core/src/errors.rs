use thiserror::Error;

use crate::engine::ParseError;
use crate::flows::FlowTransitionError;
use crate::protocol::EncodeError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid dice expression: {message}")]
    InvalidExpression { message: String },
    #[error("invalid button configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("unknown command: {name}")]
    UnknownCommand { name: String },
    #[error("message state could not be reconstructed: {message}")]
    StateReconstruction { message: String },
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
}

impl From<ParseError> for DomainError {
    fn from(value: ParseError) -> Self {
        Self::InvalidExpression { message: value.to_string() }
    }
}

impl From<EncodeError> for DomainError {
    fn from(value: EncodeError) -> Self {
        Self::InvalidConfiguration { message: value.to_string() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("cache failure: {0}")]
    Cache(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("validation failed: {message}")]
    Validation { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Text that is safe to show in an ephemeral reply. Validation failures
    /// carry their own wording; everything else collapses to a generic line.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation { message, .. } => message,
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::Validation { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::Validation { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(domain) => Self::Validation {
                message: domain.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Transport(message) | ApplicationError::Cache(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
