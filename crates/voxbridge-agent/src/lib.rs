//! Remote conversational agent launch and control.
//!
//! Builds the vendor-specific launch payload for a call ([`build_launch_request`])
//! and starts/stops the remote agent over the vendor's REST API
//! ([`AgentGateway`]). Platform and language defaults live in [`profile`].

pub mod error;
pub mod gateway;
pub mod launch;
pub mod profile;

pub use error::AgentError;
pub use gateway::{
    validate_agent_id, AgentGateway, AgentStarted, StopOutcome, DEFAULT_UPSTREAM_TIMEOUT,
};
pub use launch::{
    build_launch_request, AgentLaunchConfig, AsrConfig, LaunchOptions, LaunchPayload,
    LaunchRequest, LaunchTarget, TtsConfig,
};
pub use profile::{LanguagePreset, PlatformProfile, DEFAULT_LANGUAGE};
