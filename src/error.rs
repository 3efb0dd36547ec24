/// Error types for the portal.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("storage unavailable: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("action '{action}' not allowed for a {status} appointment")]
    ActionNotAllowed { action: String, status: String },
}

impl PortalError {
    pub fn validation(message: impl Into<String>) -> Self {
        PortalError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        PortalError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::Storage(err.to_string())
    }
}

/// Failures raised by the booking workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Neither a selected doctor nor an appointment to edit was supplied.
    #[error("no doctor selected")]
    MissingContext,

    #[error("doctor '{0}' is not in the directory")]
    DoctorNotFound(String),

    #[error("please fill all fields")]
    IncompleteDraft,

    #[error("{time} is not an available slot on {date}")]
    SlotUnavailable { date: String, time: String },

    #[error("cannot {action} while {step}")]
    InvalidStep { action: String, step: String },

    #[error("booking rejected: {0}")]
    Rejected(String),
}

pub type PortalResult<T> = Result<T, PortalError>;
