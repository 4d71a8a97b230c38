//! Text-to-speech vendor definitions.
//!
//! The remote agent renders its replies through one of several hosted TTS
//! vendors. Which vendors are available depends on the platform; see the
//! platform profiles in `voxbridge-agent`.

use crate::ParseTypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported hosted TTS vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsVendor {
    /// Azure Cognitive Services speech.
    Microsoft,
    /// ElevenLabs streaming voices.
    ElevenLabs,
    /// MiniMax T2A.
    Minimax,
    /// Volcengine (ByteDance) TTS.
    Bytedance,
}

impl TtsVendor {
    /// Returns the vendor name expected by the conversational agent API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Microsoft => "microsoft",
            Self::ElevenLabs => "elevenlabs",
            Self::Minimax => "minimax",
            Self::Bytedance => "bytedance",
        }
    }
}

impl fmt::Display for TtsVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TtsVendor {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "microsoft" | "azure" => Ok(Self::Microsoft),
            "elevenlabs" => Ok(Self::ElevenLabs),
            "minimax" => Ok(Self::Minimax),
            "bytedance" | "volcengine" => Ok(Self::Bytedance),
            _ => Err(ParseTypeError::new("tts vendor", s)),
        }
    }
}
