//! Twilio media stream message types
//!
//! Frames are JSON text, discriminated by the `event` field. Audio is base64
//! 8kHz mu-law and is passed through untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Incoming Messages (Twilio -> Gateway)
// =============================================================================

/// Incoming frames from the telephony provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyInbound {
    /// Stream metadata, first frame after `connected`
    Start {
        start: StreamStart,
    },

    /// Caller audio chunk
    Media {
        media: InboundMedia,
    },

    /// Stream is ending
    Stop {},

    /// `connected`, `mark`, `dtmf` and anything newer
    #[serde(other)]
    Other,
}

/// Body of the `start` frame
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub stream_sid: String,
    #[serde(default)]
    pub call_sid: Option<String>,
    /// `<Parameter>` values from the TwiML `<Stream>`
    #[serde(default)]
    pub custom_parameters: HashMap<String, String>,
}

impl StreamStart {
    /// Call identifier, preferring the stream metadata over the custom parameter
    /// embedded by the call-setup webhook.
    pub fn resolved_call_sid(&self) -> Option<&str> {
        self.call_sid
            .as_deref()
            .filter(|sid| !sid.is_empty())
            .or_else(|| {
                self.custom_parameters
                    .get(CALL_SID_PARAMETER)
                    .map(String::as_str)
                    .filter(|sid| !sid.is_empty())
            })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundMedia {
    pub payload: String,
}

/// Custom stream parameter carrying the call identifier.
pub const CALL_SID_PARAMETER: &str = "callSid";

/// Decode one text frame; malformed frames are logged and skipped.
pub fn decode_inbound(text: &str) -> Option<TelephonyInbound> {
    match serde_json::from_str::<TelephonyInbound>(text) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!("Failed to parse telephony frame: {}", e);
            None
        }
    }
}

// =============================================================================
// Outgoing Messages (Gateway -> Twilio)
// =============================================================================

/// Outgoing frames to the telephony provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyOutbound {
    /// Translated audio to play to the caller
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },

    /// Progress marker, echoed back by Twilio once played
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkName,
    },

    /// Flush audio queued for playback
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkName {
    pub name: String,
}

impl TelephonyOutbound {
    pub fn media(stream_sid: &str, payload: String) -> Self {
        Self::Media {
            stream_sid: stream_sid.to_string(),
            media: OutboundMedia { payload },
        }
    }

    pub fn mark(stream_sid: &str, name: String) -> Self {
        Self::Mark {
            stream_sid: stream_sid.to_string(),
            mark: MarkName { name },
        }
    }

    pub fn clear(stream_sid: &str) -> Self {
        Self::Clear {
            stream_sid: stream_sid.to_string(),
        }
    }
}
