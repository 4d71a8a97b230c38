use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("invalid token request: {0}")]
    Validation(String),

    #[error("credentials not configured: {0}")]
    Configuration(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<livekit_api::access_token::AccessTokenError> for TokenError {
    fn from(err: livekit_api::access_token::AccessTokenError) -> Self {
        TokenError::Signing(err.to_string())
    }
}
