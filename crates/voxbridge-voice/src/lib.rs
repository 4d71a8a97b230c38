//! Credentials and access tokens for the Voxbridge call service.
//!
//! Resolves per-platform API credentials from the environment at request
//! time and issues the short-lived access grants that let the human caller
//! and the remote agent join an RTC channel.
//!
//! Token signing is delegated to a [`TokenSigner`]; the default
//! [`AccessTokenSigner`] mints HS256 access tokens keyed by the platform's
//! app id and certificate.

pub mod config;
pub mod error;
pub mod service;

pub use config::{preview, read_trimmed, CredentialResolver, Credentials, EnvSource, MapEnv, ProcessEnv};
pub use error::TokenError;
pub use service::{AccessTokenSigner, SigningRequest, TokenService, TokenSigner, DEFAULT_TOKEN_TTL};
