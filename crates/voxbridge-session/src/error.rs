use thiserror::Error;
use voxbridge_agent::AgentError;
use voxbridge_types::SessionStatus;
use voxbridge_voice::TokenError;

use crate::rtc::MediaError;

/// Why a controller operation did not complete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SessionStatus,
        action: &'static str,
    },

    #[error("not configured: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    Validation(String),

    /// Vendor rejection; `message` is the vendor's text, verbatim.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    Transport(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("superseded by a newer call attempt")]
    Superseded,
}

impl CallError {
    /// The one message shown to the person on the call.
    pub fn user_message(&self) -> String {
        match self {
            CallError::InvalidTransition { from, .. } if from.is_active() => {
                "A call is already in progress.".to_string()
            }
            CallError::InvalidTransition { .. } => {
                "That action is not available right now.".to_string()
            }
            CallError::Configuration(_) => {
                "The voice service is not configured. Please contact the administrator.".to_string()
            }
            CallError::Validation(_) => "The call request was invalid.".to_string(),
            CallError::Upstream { message, .. } => {
                format!("The voice agent could not be started: {}", message)
            }
            CallError::Transport(_) => {
                "Could not reach the voice service. Please try again.".to_string()
            }
            CallError::Media(_) => {
                "Could not access the microphone or join the call.".to_string()
            }
            CallError::Superseded => "The call was cancelled.".to_string(),
        }
    }

    /// HTTP-style status, when the failure came from a vendor.
    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<TokenError> for CallError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Validation(msg) => CallError::Validation(msg),
            TokenError::Configuration(msg) => CallError::Configuration(msg),
            TokenError::Signing(msg) => CallError::Transport(msg),
        }
    }
}

impl From<AgentError> for CallError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Configuration(msg) => CallError::Configuration(msg),
            AgentError::Validation(msg) => CallError::Validation(msg),
            AgentError::Upstream {
                status, message, ..
            } => CallError::Upstream { status, message },
            AgentError::Transport { message, .. } => CallError::Transport(message),
        }
    }
}
