//! Agent launch request assembly.
//!
//! [`build_launch_request`] turns a call's identities plus the caller's
//! overrides into the vendor's `join` payload. Values are layered:
//! per-call overrides win over language presets, which win over platform
//! defaults. Nothing here touches the network.

use crate::error::AgentError;
use crate::profile::{LanguagePreset, PlatformProfile};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};
use voxbridge_types::{Platform, TtsVendor};
use voxbridge_voice::{preview, read_trimmed, EnvSource};

/// Highest sampling temperature accepted by the LLM block.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Seconds the agent stays in an empty channel before leaving on its own.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u32 = 120;

/// Conversation turns the agent keeps in its LLM context.
pub const DEFAULT_MAX_HISTORY: u32 = 32;

/// Who the agent serves and where.
#[derive(Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    pub channel_name: String,
    pub agent_uid: u32,
    pub user_uid: u32,
    /// The agent's own access token for the channel.
    pub token: String,
    pub platform: Platform,
}

impl fmt::Debug for LaunchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchTarget")
            .field("channel_name", &self.channel_name)
            .field("agent_uid", &self.agent_uid)
            .field("user_uid", &self.user_uid)
            .field("token", &format_args!("[{} bytes]", self.token.len()))
            .field("platform", &self.platform)
            .finish()
    }
}

/// Per-call overrides supplied by the caller.
///
/// Numeric fields accept JSON numbers or numeric strings; anything else is
/// ignored and the default applies.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchOptions {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default, deserialize_with = "lenient::f32_opt")]
    pub temperature: Option<f32>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub tts_vendor: Option<String>,
    #[serde(default)]
    pub llm_url: Option<String>,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub idle_timeout: Option<u32>,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub max_history: Option<u32>,
}

impl fmt::Debug for LaunchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchOptions")
            .field("language", &self.language)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("greeting", &self.greeting)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("tts_vendor", &self.tts_vendor)
            .field("llm_url", &self.llm_url)
            .field("llm_api_key", &self.llm_api_key.as_deref().map(preview))
            .field("llm_model", &self.llm_model)
            .field("idle_timeout", &self.idle_timeout)
            .field("max_history", &self.max_history)
            .finish()
    }
}

/// Speech recognition block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsrConfig {
    pub language: String,
    pub vendor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimaxVoice {
    pub voice_id: String,
}

/// Vendor-specific TTS block, serialised as `{"vendor": .., "params": {..}}`.
#[derive(Clone, PartialEq, Serialize)]
#[serde(tag = "vendor", content = "params", rename_all = "lowercase")]
pub enum TtsConfig {
    Microsoft {
        key: String,
        region: String,
        voice_name: String,
    },
    ElevenLabs {
        key: String,
        model_id: String,
        voice_id: String,
    },
    Minimax {
        key: String,
        group_id: String,
        model: String,
        voice_setting: MinimaxVoice,
    },
    Bytedance {
        token: String,
        app_id: String,
        cluster: String,
        voice_type: String,
    },
}

impl TtsConfig {
    pub fn vendor(&self) -> TtsVendor {
        match self {
            TtsConfig::Microsoft { .. } => TtsVendor::Microsoft,
            TtsConfig::ElevenLabs { .. } => TtsVendor::ElevenLabs,
            TtsConfig::Minimax { .. } => TtsVendor::Minimax,
            TtsConfig::Bytedance { .. } => TtsVendor::Bytedance,
        }
    }

    pub fn voice(&self) -> &str {
        match self {
            TtsConfig::Microsoft { voice_name, .. } => voice_name,
            TtsConfig::ElevenLabs { voice_id, .. } => voice_id,
            TtsConfig::Minimax { voice_setting, .. } => &voice_setting.voice_id,
            TtsConfig::Bytedance { voice_type, .. } => voice_type,
        }
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("vendor", &self.vendor())
            .field("voice", &self.voice())
            .finish_non_exhaustive()
    }
}

/// The resolved agent configuration for one call.
#[derive(Clone, PartialEq)]
pub struct AgentLaunchConfig {
    pub language: String,
    pub asr: AsrConfig,
    pub llm_endpoint: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub system_prompt: String,
    pub greeting: String,
    pub failure_message: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_history: u32,
    pub idle_timeout: u32,
    pub tts: TtsConfig,
}

impl fmt::Debug for AgentLaunchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentLaunchConfig")
            .field("language", &self.language)
            .field("asr", &self.asr)
            .field("llm_endpoint", &self.llm_endpoint)
            .field("llm_api_key", &preview(&self.llm_api_key))
            .field("llm_model", &self.llm_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("tts", &self.tts)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Clone, PartialEq, Serialize)]
pub struct LlmBlock {
    pub url: String,
    pub api_key: String,
    pub system_messages: Vec<ChatMessage>,
    pub greeting_message: String,
    pub failure_message: String,
    pub max_history: u32,
    pub params: LlmParams,
}

#[derive(Clone, PartialEq, Serialize)]
pub struct LaunchProperties {
    pub channel: String,
    pub token: String,
    pub agent_rtc_uid: String,
    pub remote_rtc_uids: Vec<String>,
    pub enable_string_uid: bool,
    pub idle_timeout: u32,
    pub asr: AsrConfig,
    pub llm: LlmBlock,
    pub tts: TtsConfig,
}

/// Body of the vendor's `join` call.
#[derive(Clone, PartialEq, Serialize)]
pub struct LaunchPayload {
    pub name: String,
    pub properties: LaunchProperties,
}

/// A fully built launch, ready for [`crate::AgentGateway::start_agent`].
#[derive(Clone, PartialEq)]
pub struct LaunchRequest {
    pub platform: Platform,
    pub channel_name: String,
    pub agent_uid: u32,
    pub user_uid: u32,
    pub config: AgentLaunchConfig,
    pub payload: LaunchPayload,
}

impl LaunchRequest {
    /// The payload as JSON with every credential reduced to a preview.
    pub fn redacted(&self) -> Value {
        let mut value = serde_json::to_value(&self.payload).unwrap_or(Value::Null);
        redact_secrets(&mut value);
        value
    }
}

impl fmt::Debug for LaunchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchRequest")
            .field("platform", &self.platform)
            .field("channel_name", &self.channel_name)
            .field("agent_uid", &self.agent_uid)
            .field("user_uid", &self.user_uid)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

const SECRET_FIELDS: &[&str] = &["api_key", "key", "token"];

fn redact_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                match v {
                    Value::String(s) if SECRET_FIELDS.contains(&k.as_str()) => {
                        *s = preview(s);
                    }
                    other => redact_secrets(other),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolves `key` from the environment or fails with a configuration error.
fn require(env: &dyn EnvSource, key: &str) -> Result<String, AgentError> {
    let value = read_trimmed(env, key);
    if value.is_empty() {
        return Err(AgentError::Configuration(format!("{key} is not set")));
    }
    Ok(value)
}

fn env_or(env: &dyn EnvSource, key: &str, fallback: &str) -> String {
    let value = read_trimmed(env, key);
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn tts_config(
    vendor: TtsVendor,
    preset: &LanguagePreset,
    env: &dyn EnvSource,
) -> Result<TtsConfig, AgentError> {
    let voice = preset.voice_for(vendor).to_string();
    Ok(match vendor {
        TtsVendor::Microsoft => TtsConfig::Microsoft {
            key: require(env, "MICROSOFT_TTS_KEY")?,
            region: env_or(env, "MICROSOFT_TTS_REGION", "eastus"),
            voice_name: voice,
        },
        TtsVendor::ElevenLabs => TtsConfig::ElevenLabs {
            key: require(env, "ELEVENLABS_API_KEY")?,
            model_id: env_or(env, "ELEVENLABS_MODEL_ID", "eleven_flash_v2_5"),
            voice_id: voice,
        },
        TtsVendor::Minimax => TtsConfig::Minimax {
            key: require(env, "MINIMAX_API_KEY")?,
            group_id: require(env, "MINIMAX_GROUP_ID")?,
            model: env_or(env, "MINIMAX_MODEL", "speech-01-turbo"),
            voice_setting: MinimaxVoice { voice_id: voice },
        },
        TtsVendor::Bytedance => TtsConfig::Bytedance {
            token: require(env, "BYTEDANCE_TTS_TOKEN")?,
            app_id: require(env, "BYTEDANCE_TTS_APP_ID")?,
            cluster: env_or(env, "BYTEDANCE_TTS_CLUSTER", "volcano_tts"),
            voice_type: voice,
        },
    })
}

/// Builds the launch request for one call.
///
/// # Errors
///
/// `Validation` when the target is incomplete or the two participant ids
/// coincide; `Configuration` when the LLM key or the selected TTS vendor's
/// credentials are unset.
pub fn build_launch_request(
    target: &LaunchTarget,
    options: &LaunchOptions,
    env: &dyn EnvSource,
) -> Result<LaunchRequest, AgentError> {
    let channel_name = target.channel_name.trim();
    if channel_name.is_empty() {
        return Err(AgentError::Validation("channelName is required".to_string()));
    }
    if target.token.trim().is_empty() {
        return Err(AgentError::Validation("agent token is required".to_string()));
    }
    if target.agent_uid == target.user_uid {
        return Err(AgentError::Validation(format!(
            "agent uid {} collides with user uid",
            target.agent_uid
        )));
    }

    let profile = PlatformProfile::for_platform(target.platform);

    let (vendor, fell_back) = profile.select_tts(options.tts_vendor.as_deref());
    if fell_back {
        warn!(
            platform = %target.platform,
            requested = options.tts_vendor.as_deref().unwrap_or_default(),
            using = %vendor,
            "unsupported tts vendor, using platform default"
        );
    }

    let language = non_empty(options.language.as_deref()).unwrap_or(crate::profile::DEFAULT_LANGUAGE);
    let preset = LanguagePreset::lookup(language);

    let llm_api_key = match non_empty(options.llm_api_key.as_deref()) {
        Some(key) => key.to_string(),
        None => require(env, "LLM_API_KEY")?,
    };
    let llm_endpoint = non_empty(options.llm_url.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| env_or(env, "LLM_URL", profile.llm_url));
    let llm_model = non_empty(options.llm_model.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| env_or(env, "LLM_MODEL", profile.llm_model));

    let system_prompt = non_empty(options.system_prompt.as_deref())
        .unwrap_or(preset.system_prompt)
        .to_string();
    let greeting = non_empty(options.greeting.as_deref())
        .unwrap_or(preset.greeting)
        .to_string();

    let temperature = options
        .temperature
        .filter(|t| t.is_finite())
        .unwrap_or(profile.default_temperature)
        .clamp(0.0, MAX_TEMPERATURE);
    let max_tokens = options
        .max_tokens
        .filter(|m| *m > 0)
        .unwrap_or(profile.default_max_tokens);
    let max_history = options
        .max_history
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_MAX_HISTORY);
    let idle_timeout = options.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS);

    let config = AgentLaunchConfig {
        language: preset.tag.to_string(),
        asr: AsrConfig {
            language: preset.tag.to_string(),
            vendor: profile.asr_vendor.to_string(),
        },
        llm_endpoint,
        llm_api_key,
        llm_model,
        system_prompt,
        greeting,
        failure_message: preset.failure_message.to_string(),
        temperature,
        max_tokens,
        max_history,
        idle_timeout,
        tts: tts_config(vendor, preset, env)?,
    };

    let payload = LaunchPayload {
        name: format!("agent-{}-{}", channel_name, target.agent_uid),
        properties: LaunchProperties {
            channel: channel_name.to_string(),
            token: target.token.clone(),
            agent_rtc_uid: target.agent_uid.to_string(),
            remote_rtc_uids: vec![target.user_uid.to_string()],
            enable_string_uid: false,
            idle_timeout: config.idle_timeout,
            asr: config.asr.clone(),
            llm: LlmBlock {
                url: config.llm_endpoint.clone(),
                api_key: config.llm_api_key.clone(),
                system_messages: vec![ChatMessage {
                    role: "system".to_string(),
                    content: config.system_prompt.clone(),
                }],
                greeting_message: config.greeting.clone(),
                failure_message: config.failure_message.clone(),
                max_history: config.max_history,
                params: LlmParams {
                    model: config.llm_model.clone(),
                    temperature: config.temperature,
                    max_tokens: config.max_tokens,
                },
            },
            tts: config.tts.clone(),
        },
    };

    let request = LaunchRequest {
        platform: target.platform,
        channel_name: channel_name.to_string(),
        agent_uid: target.agent_uid,
        user_uid: target.user_uid,
        config,
        payload,
    };

    debug!(payload = %request.redacted(), "built agent launch request");
    Ok(request)
}

mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    impl NumberOrText {
        fn as_f64(&self) -> Option<f64> {
            let n = match self {
                NumberOrText::Number(n) => *n,
                NumberOrText::Text(s) if s.trim().is_empty() => return None,
                NumberOrText::Text(s) => match s.trim().parse::<f64>() {
                    Ok(n) => n,
                    Err(_) => {
                        warn!(value = %s, "ignoring non-numeric launch option");
                        return None;
                    }
                },
            };
            n.is_finite().then_some(n)
        }
    }

    pub(super) fn f32_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
        Ok(Option::<NumberOrText>::deserialize(d)?
            .and_then(|v| v.as_f64())
            .map(|n| n as f32))
    }

    pub(super) fn u32_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(Option::<NumberOrText>::deserialize(d)?
            .and_then(|v| v.as_f64())
            .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map(|n| n.round() as u32))
    }
}
