use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use voxbridge_types::Platform;

/// Source of environment-style settings.
///
/// Settings are read on every lookup rather than cached at start-up, so a
/// rotated secret takes effect on the next request.
pub trait EnvSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed key/value settings, used by tests and embedded deployments.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    values: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Reads `key` and trims surrounding whitespace. Missing keys read as `""`.
///
/// Copy-pasted secrets frequently carry a trailing newline or space, which
/// upstream APIs reject with an opaque auth error.
pub fn read_trimmed(source: &dyn EnvSource, key: &str) -> String {
    source
        .get(key)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Loggable preview of a secret: first four characters and total length.
pub fn preview(secret: &str) -> String {
    if secret.is_empty() {
        return "<empty>".to_string();
    }
    let head: String = secret.chars().take(4).collect();
    format!("{}... ({} chars)", head, secret.chars().count())
}

/// API credentials for one platform.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub app_certificate: String,
    /// Customer id for REST API Basic auth.
    pub client_id: String,
    /// Customer secret for REST API Basic auth.
    pub client_secret: String,
}

impl Credentials {
    /// Both the app id and the certificate are present.
    pub fn has_signing_material(&self) -> bool {
        !self.app_id.is_empty() && !self.app_certificate.is_empty()
    }

    /// The app id and both REST credentials are present.
    pub fn has_api_auth(&self) -> bool {
        !self.app_id.is_empty() && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_certificate", &preview(&self.app_certificate))
            .field("client_id", &preview(&self.client_id))
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Maps a platform to its credential set.
///
/// Variables are `<PREFIX>_APP_ID`, `<PREFIX>_APP_CERTIFICATE`,
/// `<PREFIX>_CUSTOMER_ID` and `<PREFIX>_CUSTOMER_SECRET`, where the prefix
/// is [`Platform::env_prefix`].
#[derive(Clone)]
pub struct CredentialResolver {
    env: Arc<dyn EnvSource>,
}

impl CredentialResolver {
    pub fn new(env: Arc<dyn EnvSource>) -> Self {
        Self { env }
    }

    /// Resolves the credentials for `platform`.
    ///
    /// Never fails: unset values come back as empty strings and callers
    /// validate before use.
    pub fn resolve(&self, platform: Platform) -> Credentials {
        let prefix = platform.env_prefix();
        let read = |suffix: &str| read_trimmed(self.env.as_ref(), &format!("{prefix}_{suffix}"));
        Credentials {
            app_id: read("APP_ID"),
            app_certificate: read("APP_CERTIFICATE"),
            client_id: read("CUSTOMER_ID"),
            client_secret: read("CUSTOMER_SECRET"),
        }
    }

    /// The underlying settings source.
    pub fn env(&self) -> &Arc<dyn EnvSource> {
        &self.env
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(env: MapEnv) -> CredentialResolver {
        CredentialResolver::new(Arc::new(env))
    }

    #[test]
    fn resolves_per_platform_and_trims() {
        let env = MapEnv::new()
            .with("AGORA_APP_ID", "  app-a\n")
            .with("AGORA_APP_CERTIFICATE", "cert-a ")
            .with("SHENGWANG_APP_ID", "app-b");
        let r = resolver(env);

        let a = r.resolve(Platform::Agora);
        assert_eq!(a.app_id, "app-a");
        assert_eq!(a.app_certificate, "cert-a");
        assert!(a.has_signing_material());

        let b = r.resolve(Platform::Shengwang);
        assert_eq!(b.app_id, "app-b");
        assert!(!b.has_signing_material());
    }

    #[test]
    fn missing_values_resolve_empty() {
        let creds = resolver(MapEnv::new()).resolve(Platform::Agora);
        assert_eq!(creds, Credentials::default());
        assert!(!creds.has_api_auth());
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let env = MapEnv::new()
            .with("AGORA_APP_ID", "app")
            .with("AGORA_APP_CERTIFICATE", "   ");
        assert!(!resolver(env).resolve(Platform::Agora).has_signing_material());
    }

    #[test]
    fn debug_never_prints_secrets() {
        let creds = Credentials {
            app_id: "app".into(),
            app_certificate: "certificate-value".into(),
            client_id: "customer-id".into(),
            client_secret: "super-secret".into(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("certificate-value"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("cert..."));
    }

    #[test]
    fn preview_shows_prefix_and_length() {
        assert_eq!(preview("abcdefgh"), "abcd... (8 chars)");
        assert_eq!(preview("ab"), "ab... (2 chars)");
        assert_eq!(preview(""), "<empty>");
    }
}
