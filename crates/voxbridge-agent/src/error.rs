use thiserror::Error;

/// Errors from building or sending agent requests.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("agent not configured: {0}")]
    Configuration(String),

    #[error("invalid agent request: {0}")]
    Validation(String),

    /// The vendor answered with a non-2xx status. `message` is the vendor's
    /// own message, verbatim.
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        details: String,
    },

    /// The request never produced a usable response.
    #[error("{message}")]
    Transport { message: String, details: String },
}

impl AgentError {
    /// HTTP status this error should surface as.
    pub fn status_code(&self) -> u16 {
        match self {
            AgentError::Validation(_) => 400,
            AgentError::Upstream { status, .. } => *status,
            AgentError::Configuration(_) | AgentError::Transport { .. } => 500,
        }
    }

    /// Raw diagnostic text, when any was captured.
    pub fn details(&self) -> Option<&str> {
        match self {
            AgentError::Upstream { details, .. } | AgentError::Transport { details, .. }
                if !details.is_empty() =>
            {
                Some(details.as_str())
            }
            _ => None,
        }
    }
}
