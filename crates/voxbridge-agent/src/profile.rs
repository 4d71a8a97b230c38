//! Per-platform and per-language defaults for agent launches.

use voxbridge_types::{Platform, TtsVendor};

/// Locale used when the requested language has no preset.
pub const DEFAULT_LANGUAGE: &str = "zh-CN";

/// Fixed configuration record for one platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformProfile {
    pub platform: Platform,
    /// Conversational agent REST base, without a trailing slash.
    pub api_base: &'static str,
    pub asr_vendor: &'static str,
    /// Default chat-completions endpoint for the agent's LLM.
    pub llm_url: &'static str,
    pub llm_model: &'static str,
    pub allowed_tts: &'static [TtsVendor],
    pub default_tts: TtsVendor,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
}

const AGORA: PlatformProfile = PlatformProfile {
    platform: Platform::Agora,
    api_base: "https://api.agora.io/api/conversational-ai-agent/v2",
    asr_vendor: "ares",
    llm_url: "https://api.openai.com/v1/chat/completions",
    llm_model: "gpt-4o-mini",
    allowed_tts: &[TtsVendor::Microsoft, TtsVendor::ElevenLabs],
    default_tts: TtsVendor::Microsoft,
    default_temperature: 0.7,
    default_max_tokens: 1024,
};

const SHENGWANG: PlatformProfile = PlatformProfile {
    platform: Platform::Shengwang,
    api_base: "https://api.sd-rtn.com/cn/api/conversational-ai-agent/v2",
    asr_vendor: "fengming",
    llm_url: "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions",
    llm_model: "qwen-plus",
    allowed_tts: &[TtsVendor::Minimax, TtsVendor::Bytedance, TtsVendor::Microsoft],
    default_tts: TtsVendor::Minimax,
    default_temperature: 0.8,
    default_max_tokens: 1500,
};

impl PlatformProfile {
    pub fn for_platform(platform: Platform) -> &'static PlatformProfile {
        match platform {
            Platform::Agora => &AGORA,
            Platform::Shengwang => &SHENGWANG,
        }
    }

    pub fn allows(&self, vendor: TtsVendor) -> bool {
        self.allowed_tts.contains(&vendor)
    }

    /// Picks the TTS vendor for a launch.
    ///
    /// Unknown or disallowed vendor names fall back to the platform default
    /// without an error. The second value is `true` when a fallback happened
    /// for an explicitly requested vendor.
    pub fn select_tts(&self, requested: Option<&str>) -> (TtsVendor, bool) {
        let Some(name) = requested.map(str::trim).filter(|n| !n.is_empty()) else {
            return (self.default_tts, false);
        };
        match name.parse::<TtsVendor>() {
            Ok(vendor) if self.allows(vendor) => (vendor, false),
            _ => (self.default_tts, true),
        }
    }
}

/// Language-specific agent defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePreset {
    pub tag: &'static str,
    pub greeting: &'static str,
    pub failure_message: &'static str,
    pub system_prompt: &'static str,
    pub microsoft_voice: &'static str,
    pub elevenlabs_voice: &'static str,
    pub minimax_voice: &'static str,
    pub bytedance_voice: &'static str,
}

const PRESETS: &[LanguagePreset] = &[
    LanguagePreset {
        tag: "zh-CN",
        greeting: "你好，我是你的语音助手，有什么可以帮你的吗？",
        failure_message: "抱歉，我刚才没有听清楚，请再说一遍。",
        system_prompt: "你是一个友好、简洁的中文语音助手。请用口语化的短句回答，\
                        不要使用列表、表格或 Markdown 格式。",
        microsoft_voice: "zh-CN-XiaoxiaoNeural",
        elevenlabs_voice: "21m00Tcm4TlvDq8ikWAM",
        minimax_voice: "female-shaonv",
        bytedance_voice: "BV001_streaming",
    },
    LanguagePreset {
        tag: "en-US",
        greeting: "Hi there! I'm your voice assistant. How can I help you today?",
        failure_message: "Sorry, I didn't catch that. Could you say it again?",
        system_prompt: "You are a friendly, concise English voice assistant. Answer in \
                        short spoken sentences and never use lists, tables or Markdown.",
        microsoft_voice: "en-US-AndrewMultilingualNeural",
        elevenlabs_voice: "21m00Tcm4TlvDq8ikWAM",
        minimax_voice: "English_Graceful_Lady",
        bytedance_voice: "BV027_streaming",
    },
    LanguagePreset {
        tag: "ja-JP",
        greeting: "こんにちは、音声アシスタントです。ご用件は何でしょうか？",
        failure_message: "すみません、よく聞き取れませんでした。もう一度お願いします。",
        system_prompt: "あなたは親切で簡潔な日本語の音声アシスタントです。短い話し言葉で答え、\
                        箇条書きや表、Markdown は使わないでください。",
        microsoft_voice: "ja-JP-NanamiNeural",
        elevenlabs_voice: "21m00Tcm4TlvDq8ikWAM",
        minimax_voice: "Japanese_KindLady",
        bytedance_voice: "BV522_streaming",
    },
];

impl LanguagePreset {
    /// Exact-match lookup on the language tag, falling back to
    /// [`DEFAULT_LANGUAGE`].
    pub fn lookup(tag: &str) -> &'static LanguagePreset {
        PRESETS
            .iter()
            .find(|p| p.tag == tag)
            .unwrap_or_else(Self::default_preset)
    }

    pub fn default_preset() -> &'static LanguagePreset {
        &PRESETS[0]
    }

    pub fn all() -> &'static [LanguagePreset] {
        PRESETS
    }

    pub fn voice_for(&self, vendor: TtsVendor) -> &'static str {
        match vendor {
            TtsVendor::Microsoft => self.microsoft_voice,
            TtsVendor::ElevenLabs => self.elevenlabs_voice,
            TtsVendor::Minimax => self.minimax_voice,
            TtsVendor::Bytedance => self.bytedance_voice,
        }
    }
}
