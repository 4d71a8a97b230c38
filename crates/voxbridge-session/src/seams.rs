//! Service seams the controller depends on, with their production
//! implementations.

use async_trait::async_trait;
use voxbridge_agent::{
    build_launch_request, AgentError, AgentGateway, AgentStarted, LaunchOptions, LaunchTarget,
    StopOutcome,
};
use voxbridge_types::{AccessGrant, Platform};
use voxbridge_voice::{TokenError, TokenService};

/// Hands out access grants for channel participants.
#[async_trait]
pub trait GrantIssuer: Send + Sync {
    async fn issue(
        &self,
        channel_name: &str,
        participant_id: u32,
        platform: Platform,
    ) -> Result<AccessGrant, TokenError>;
}

/// Starts and stops the remote conversational agent.
#[async_trait]
pub trait AgentControl: Send + Sync {
    async fn launch(
        &self,
        target: &LaunchTarget,
        options: &LaunchOptions,
    ) -> Result<AgentStarted, AgentError>;

    /// Never fails; problems are carried in the outcome.
    async fn stop(&self, agent_id: &str, platform: Platform) -> StopOutcome;
}

#[async_trait]
impl GrantIssuer for TokenService {
    async fn issue(
        &self,
        channel_name: &str,
        participant_id: u32,
        platform: Platform,
    ) -> Result<AccessGrant, TokenError> {
        self.issue_default(channel_name, participant_id, platform)
    }
}

#[async_trait]
impl AgentControl for AgentGateway {
    async fn launch(
        &self,
        target: &LaunchTarget,
        options: &LaunchOptions,
    ) -> Result<AgentStarted, AgentError> {
        let request = build_launch_request(target, options, self.resolver().env().as_ref())?;
        tracing::debug!(launch = %request.redacted(), "launch request built");
        self.start_agent(&request).await
    }

    async fn stop(&self, agent_id: &str, platform: Platform) -> StopOutcome {
        self.stop_agent(agent_id, platform).await
    }
}
