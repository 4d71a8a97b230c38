//! Seam to the RTC media SDK.
//!
//! The controller never touches media directly; it drives an [`RtcClient`]
//! and reacts to the [`RtcEvent`]s the SDK reports.

use async_trait::async_trait;
use thiserror::Error;
use voxbridge_types::AccessGrant;

/// Local media failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("failed to join channel: {0}")]
    Join(String),

    #[error("microphone unavailable: {0}")]
    Microphone(String),

    #[error("failed to leave channel: {0}")]
    Leave(String),

    #[error("rtc client error: {0}")]
    Client(String),
}

/// Remote-side notifications from the media SDK. They may arrive at any
/// time, including while a call is still connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtcEvent {
    RemoteJoined(u32),
    RemoteLeft(u32),
    RemotePublished(u32),
    RemoteUnpublished(u32),
    ConnectionLost(String),
}

#[async_trait]
pub trait RtcClient: Send + Sync {
    /// Joins the grant's channel as the grant's participant.
    async fn join(&self, grant: &AccessGrant) -> Result<(), MediaError>;

    /// Captures and publishes the local microphone track.
    async fn publish_microphone(&self) -> Result<(), MediaError>;

    /// Stops and releases the local microphone track.
    async fn stop_microphone(&self) -> Result<(), MediaError>;

    /// Drops every remote subscription and event listener.
    async fn unsubscribe_all(&self) -> Result<(), MediaError>;

    async fn leave(&self) -> Result<(), MediaError>;
}
