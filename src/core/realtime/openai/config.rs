//! OpenAI Realtime connection constants and enumerations.

use serde::{Deserialize, Serialize};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Model used when none is configured.
pub const DEFAULT_OPENAI_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";

/// Beta header value selecting the event schema this client speaks.
pub const OPENAI_BETA_HEADER: &str = "realtime=v1";

/// Audio format on both directions of the leg. Matches the telephony codec so
/// payloads pass through without transcoding.
pub const TELEPHONY_AUDIO_FORMAT: &str = "g711_ulaw";

// =============================================================================
// Voices
// =============================================================================

/// Voices accepted by the Realtime API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAIRealtimeVoice {
    #[default]
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Sage,
    Shimmer,
    Verse,
}

impl OpenAIRealtimeVoice {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    /// Parse a configured voice name; `None` when the name is not a known voice.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|voice| voice.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn all() -> &'static [OpenAIRealtimeVoice] {
        &[
            Self::Alloy,
            Self::Ash,
            Self::Ballad,
            Self::Coral,
            Self::Echo,
            Self::Sage,
            Self::Shimmer,
            Self::Verse,
        ]
    }
}

impl std::fmt::Display for OpenAIRealtimeVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Modalities
// =============================================================================

/// Output modalities requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_parse() {
        assert_eq!(
            OpenAIRealtimeVoice::parse("alloy"),
            Some(OpenAIRealtimeVoice::Alloy)
        );
        assert_eq!(
            OpenAIRealtimeVoice::parse(" SHIMMER "),
            Some(OpenAIRealtimeVoice::Shimmer)
        );
        assert_eq!(OpenAIRealtimeVoice::parse("nova"), None);
    }

    #[test]
    fn test_voice_all() {
        let voices = OpenAIRealtimeVoice::all();
        assert_eq!(voices.len(), 8);
        assert!(voices.contains(&OpenAIRealtimeVoice::Verse));
    }

    #[test]
    fn test_modality_serializes_lowercase() {
        let json = serde_json::to_string(&[Modality::Text, Modality::Audio]).unwrap();
        assert_eq!(json, r#"["text","audio"]"#);
    }
}
