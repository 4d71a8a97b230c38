//! Short-lived access grants.

use crate::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed credential authorizing one participant to join one channel.
///
/// Grants are created per participant per call and never persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    /// Opaque signed token handed to the RTC SDK.
    pub token: String,
    /// Application id the token was signed for.
    pub app_id: String,
    pub channel_name: String,
    pub participant_id: u32,
    pub platform: Platform,
    pub expires_at: DateTime<Utc>,
}

impl AccessGrant {
    /// Returns `true` once the grant's expiry has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl std::fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGrant")
            .field("token", &format_args!("[{} bytes]", self.token.len()))
            .field("app_id", &self.app_id)
            .field("channel_name", &self.channel_name)
            .field("participant_id", &self.participant_id)
            .field("platform", &self.platform)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn grant() -> AccessGrant {
        AccessGrant {
            token: "secret-token".to_string(),
            app_id: "app".to_string(),
            channel_name: "call-1".to_string(),
            participant_id: 42,
            platform: Platform::Agora,
            expires_at: Utc::now() + Duration::seconds(60),
        }
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", grant());
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[12 bytes]"));
    }

    #[test]
    fn expiry_check() {
        let g = grant();
        assert!(!g.is_expired_at(Utc::now()));
        assert!(g.is_expired_at(g.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(grant()).unwrap();
        assert_eq!(value["channelName"], "call-1");
        assert_eq!(value["participantId"], 42);
        assert_eq!(value["platform"], "agora");
    }
}
