//! Shared types and vocabulary for the Voxbridge call service.
//!
//! This crate provides the foundational types used across all Voxbridge
//! crates: the RTC platform selector, participant roles, call session
//! status, and the short-lived access grant issued per participant.
//!
//! No crate in the workspace depends on anything *except* `voxbridge-types`
//! for cross-cutting type definitions. This keeps the dependency graph clean
//! and prevents circular dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod grant;
mod voice;

pub use grant::AccessGrant;
pub use voice::TtsVendor;

/// Real-time communication platform a call is routed through.
///
/// Both platforms expose the same channel and conversational-agent APIs but
/// use separate credentials, API hosts, and model defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Global region.
    #[default]
    Agora,
    /// Mainland China region.
    Shengwang,
}

impl Platform {
    /// Every supported platform, in declaration order.
    pub const ALL: [Platform; 2] = [Platform::Agora, Platform::Shengwang];

    /// Returns the canonical wire label for this platform.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agora => "agora",
            Self::Shengwang => "shengwang",
        }
    }

    /// Prefix used for this platform's environment variables.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Self::Agora => "AGORA",
            Self::Shengwang => "SHENGWANG",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agora" => Ok(Self::Agora),
            "shengwang" => Ok(Self::Shengwang),
            _ => Err(ParseTypeError::new("platform", s)),
        }
    }
}

/// Publishing rights carried by an access grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May publish and subscribe to media.
    #[default]
    Publisher,
    /// May only subscribe.
    Subscriber,
}

impl Role {
    pub fn can_publish(self) -> bool {
        matches!(self, Self::Publisher)
    }
}

/// Lifecycle status of a call session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No call in progress.
    #[default]
    Idle,
    /// Tokens, channel join and agent launch are in flight.
    Connecting,
    /// Channel joined and remote agent running.
    Connected,
    /// The remote agent is currently publishing audio.
    Talking,
    /// The last attempt failed; waiting for retry or reset.
    Error,
}

impl SessionStatus {
    /// Returns `true` while a call is live (Connected or Talking).
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connected | Self::Talking)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Talking => "talking",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown platform or vendor label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseTypeError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseTypeError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
