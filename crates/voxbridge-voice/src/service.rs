use crate::config::{preview, CredentialResolver};
use crate::error::TokenError;
use chrono::Utc;
use livekit_api::access_token::{AccessToken, VideoGrants};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use voxbridge_types::{AccessGrant, Platform, Role};

/// Default lifetime of an access grant (one hour).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Everything the signing primitive needs to mint one grant.
#[derive(Clone, Copy)]
pub struct SigningRequest<'a> {
    pub app_id: &'a str,
    pub app_certificate: &'a str,
    pub channel_name: &'a str,
    pub participant_id: u32,
    pub role: Role,
    pub ttl: Duration,
}

/// The vendor token-signing primitive.
///
/// Implementations are trusted: the service validates inputs and
/// credentials before calling `sign`, and never calls it with empty
/// credentials.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, request: &SigningRequest<'_>) -> Result<String, TokenError>;
}

/// Signs grants as HS256 access tokens keyed by the app id and certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessTokenSigner;

impl TokenSigner for AccessTokenSigner {
    fn sign(&self, request: &SigningRequest<'_>) -> Result<String, TokenError> {
        let identity = request.participant_id.to_string();
        let token = AccessToken::with_api_key(request.app_id, request.app_certificate)
            .with_identity(&identity)
            .with_name(&identity)
            .with_grants(VideoGrants {
                room_join: true,
                room: request.channel_name.to_string(),
                can_publish: request.role.can_publish(),
                can_subscribe: true,
                can_publish_data: request.role.can_publish(),
                ..Default::default()
            })
            .with_ttl(request.ttl);

        Ok(token.to_jwt()?)
    }
}

/// Issues short-lived access grants for channel participants.
#[derive(Clone)]
pub struct TokenService {
    resolver: CredentialResolver,
    signer: Arc<dyn TokenSigner>,
}

impl TokenService {
    pub fn new(resolver: CredentialResolver) -> Self {
        Self::with_signer(resolver, Arc::new(AccessTokenSigner))
    }

    pub fn with_signer(resolver: CredentialResolver, signer: Arc<dyn TokenSigner>) -> Self {
        Self { resolver, signer }
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Issues a publisher grant with the default one-hour lifetime.
    pub fn issue_default(
        &self,
        channel_name: &str,
        participant_id: u32,
        platform: Platform,
    ) -> Result<AccessGrant, TokenError> {
        self.issue_token(
            channel_name,
            participant_id,
            platform,
            Role::Publisher,
            DEFAULT_TOKEN_TTL,
        )
    }

    /// Issues a grant for `participant_id` to join `channel_name`.
    ///
    /// Grants are not renewed; a call that outlives `ttl` keeps its media
    /// session only for as long as the RTC platform tolerates the expired
    /// token.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty channel or zero TTL, `Configuration` when
    /// the platform's app id or certificate is unset (the signer is not
    /// called), `Signing` when the signer rejects the request.
    pub fn issue_token(
        &self,
        channel_name: &str,
        participant_id: u32,
        platform: Platform,
        role: Role,
        ttl: Duration,
    ) -> Result<AccessGrant, TokenError> {
        let channel_name = channel_name.trim();
        if channel_name.is_empty() {
            return Err(TokenError::Validation(
                "channel name must not be empty".to_string(),
            ));
        }
        if ttl.is_zero() {
            return Err(TokenError::Validation(
                "token ttl must be positive".to_string(),
            ));
        }

        let creds = self.resolver.resolve(platform);
        if !creds.has_signing_material() {
            warn!(
                %platform,
                app_id_len = creds.app_id.len(),
                certificate_len = creds.app_certificate.len(),
                "refusing to sign token without credentials"
            );
            return Err(TokenError::Configuration(format!(
                "{prefix}_APP_ID and {prefix}_APP_CERTIFICATE must be set",
                prefix = platform.env_prefix()
            )));
        }

        debug!(
            %platform,
            app_id = %preview(&creds.app_id),
            certificate = %preview(&creds.app_certificate),
            "resolved signing credentials"
        );

        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| TokenError::Validation(format!("token ttl out of range: {}", e)))?;

        let token = self.signer.sign(&SigningRequest {
            app_id: &creds.app_id,
            app_certificate: &creds.app_certificate,
            channel_name,
            participant_id,
            role,
            ttl,
        })?;

        info!(
            %platform,
            channel = channel_name,
            participant_id,
            token_len = token.len(),
            ttl_secs = ttl.as_secs(),
            "issued access token"
        );

        Ok(AccessGrant {
            token,
            app_id: creds.app_id,
            channel_name: channel_name.to_string(),
            participant_id,
            platform,
            expires_at,
        })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnv;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSigner {
        calls: AtomicUsize,
    }

    impl TokenSigner for CountingSigner {
        fn sign(&self, request: &SigningRequest<'_>) -> Result<String, TokenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                "{}:{}:{}",
                request.app_id, request.channel_name, request.participant_id
            ))
        }
    }

    fn service(env: MapEnv) -> (TokenService, Arc<CountingSigner>) {
        let signer = Arc::new(CountingSigner::default());
        let svc = TokenService::with_signer(CredentialResolver::new(Arc::new(env)), signer.clone());
        (svc, signer)
    }

    fn configured() -> MapEnv {
        MapEnv::new()
            .with("AGORA_APP_ID", "app-a")
            .with("AGORA_APP_CERTIFICATE", "cert-a")
            .with("SHENGWANG_APP_ID", "app-b")
            .with("SHENGWANG_APP_CERTIFICATE", "cert-b")
    }

    #[test]
    fn missing_credentials_never_reach_signer() {
        for platform in Platform::ALL {
            for (id, cert) in [("", "cert"), ("app", ""), ("", "")] {
                let prefix = platform.env_prefix();
                let env = MapEnv::new()
                    .with(format!("{prefix}_APP_ID"), id)
                    .with(format!("{prefix}_APP_CERTIFICATE"), cert);
                let (svc, signer) = service(env);

                let err = svc.issue_default("call-1", 7, platform).unwrap_err();
                assert!(matches!(err, TokenError::Configuration(_)), "{platform}: {err}");
                assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
            }
        }
    }

    #[test]
    fn empty_channel_is_rejected() {
        let (svc, signer) = service(configured());
        let err = svc.issue_default("   ", 7, Platform::Agora).unwrap_err();
        assert!(matches!(err, TokenError::Validation(_)));
        assert_eq!(signer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let (svc, _) = service(configured());
        let err = svc
            .issue_token("call-1", 7, Platform::Agora, Role::Publisher, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, TokenError::Validation(_)));
    }

    #[test]
    fn grant_uses_platform_credentials_and_expiry() {
        let (svc, signer) = service(configured());
        let before = Utc::now();
        let grant = svc
            .issue_token(
                "call-1",
                42,
                Platform::Shengwang,
                Role::Publisher,
                Duration::from_secs(600),
            )
            .unwrap();

        assert_eq!(grant.token, "app-b:call-1:42");
        assert_eq!(grant.app_id, "app-b");
        assert_eq!(grant.participant_id, 42);
        assert_eq!(grant.platform, Platform::Shengwang);
        assert!(grant.expires_at >= before + chrono::Duration::seconds(600));
        assert!(grant.expires_at <= Utc::now() + chrono::Duration::seconds(600));
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
    }
}
