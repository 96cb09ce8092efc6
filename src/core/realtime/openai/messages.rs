//! OpenAI Realtime API WebSocket message types.
//!
//! Only the part of the protocol the translation leg speaks is modelled.
//!
//! # Protocol Overview
//!
//! Client events (sent to server):
//! - session.update - Configure the session once after connecting
//! - input_audio_buffer.append - Append caller audio
//! - response.create - Ask for a translated utterance
//! - response.cancel - Cancel the utterance in flight
//!
//! Server events (received from server):
//! - session.created / session.updated
//! - input_audio_buffer.speech_started / speech_stopped
//! - response.created
//! - response.audio.delta (newer schema: response.output_audio.delta)
//! - response.done
//! - error
//!
//! Every other server event decodes to [`ServerEvent::Unknown`] and is ignored.

use serde::{Deserialize, Serialize};

use super::config::{Modality, TELEPHONY_AUDIO_FORMAT};
use crate::core::realtime::base::{SessionSettings, TranslationCommand, TranslationEvent};

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration for OpenAI Realtime API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Response modalities (text, audio)
    pub modalities: Vec<Modality>,

    /// System instructions for the interpreter
    pub instructions: String,

    /// Voice for audio output
    pub voice: String,

    /// Input audio format
    pub input_audio_format: String,

    /// Output audio format
    pub output_audio_format: String,

    /// Input audio transcription configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,

    /// Turn detection configuration
    pub turn_detection: TurnDetection,

    /// Temperature for response generation
    pub temperature: f32,

    /// Maximum response output tokens
    pub max_response_output_tokens: u32,
}

impl SessionConfig {
    /// Session for a telephony translation leg.
    ///
    /// Automatic responses are disabled on the server: the relay decides
    /// when to request and cancel responses.
    pub fn for_translation(settings: &SessionSettings) -> Self {
        Self {
            modalities: vec![Modality::Text, Modality::Audio],
            instructions: settings.instructions.clone(),
            voice: settings.voice.clone(),
            input_audio_format: TELEPHONY_AUDIO_FORMAT.to_string(),
            output_audio_format: TELEPHONY_AUDIO_FORMAT.to_string(),
            input_audio_transcription: settings
                .transcription_model
                .as_ref()
                .map(|model| InputAudioTranscription {
                    model: model.clone(),
                }),
            turn_detection: TurnDetection::ServerVad {
                threshold: settings.vad.threshold,
                prefix_padding_ms: settings.vad.prefix_padding_ms,
                silence_duration_ms: settings.vad.silence_duration_ms,
                create_response: false,
                interrupt_response: false,
            },
            temperature: settings.temperature,
            max_response_output_tokens: settings.max_response_output_tokens,
        }
    }
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g., "whisper-1")
    pub model: String,
}

/// Turn detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        threshold: f32,
        prefix_padding_ms: u32,
        silence_duration_ms: u32,
        /// Whether the server starts a response when a turn ends
        create_response: bool,
        /// Whether the server cancels a response when speech starts
        interrupt_response: bool,
    },
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: Box<SessionConfig>,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio data
        audio: String,
    },

    /// Create a response
    #[serde(rename = "response.create")]
    ResponseCreate,

    /// Cancel the current response
    #[serde(rename = "response.cancel")]
    ResponseCancel,
}

impl From<TranslationCommand> for ClientEvent {
    fn from(command: TranslationCommand) -> Self {
        match command {
            TranslationCommand::Configure(settings) => Self::SessionUpdate {
                session: Box::new(SessionConfig::for_translation(&settings)),
            },
            TranslationCommand::AppendAudio(audio) => Self::InputAudioBufferAppend { audio },
            TranslationCommand::CreateResponse => Self::ResponseCreate,
            TranslationCommand::CancelResponse => Self::ResponseCancel,
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error {
        /// Error details
        error: ApiError,
    },

    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated {
        /// Session information
        session: SessionInfo,
    },

    /// Session updated
    #[serde(rename = "session.updated")]
    SessionUpdated {},

    /// Speech started in input buffer
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        /// Audio start time in ms
        #[serde(default)]
        audio_start_ms: u64,
    },

    /// Speech stopped in input buffer
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {
        /// Audio end time in ms
        #[serde(default)]
        audio_end_ms: u64,
    },

    /// Response created
    #[serde(rename = "response.created")]
    ResponseCreated {
        /// Response information
        response: ResponseInfo,
    },

    /// Audio delta (audio data chunk)
    #[serde(rename = "response.audio.delta", alias = "response.output_audio.delta")]
    AudioDelta {
        /// Response ID
        #[serde(default)]
        response_id: Option<String>,
        /// Base64-encoded audio delta
        delta: String,
    },

    /// Response done (completed, cancelled or failed)
    #[serde(rename = "response.done")]
    ResponseDone {
        /// Final response information
        response: ResponseInfo,
    },

    /// Any event the translation leg does not act on
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Map to the provider-agnostic leg event. `None` for ignored events.
    pub fn into_translation_event(self) -> Option<TranslationEvent> {
        match self {
            Self::Error { error } => Some(TranslationEvent::Error {
                code: error.code,
                message: error.message,
            }),
            Self::SessionCreated { session } => Some(TranslationEvent::SessionCreated {
                session_id: session.id,
            }),
            Self::SessionUpdated {} => Some(TranslationEvent::SessionUpdated),
            Self::SpeechStarted { audio_start_ms } => Some(TranslationEvent::SpeechStarted {
                audio_ms: audio_start_ms,
            }),
            Self::SpeechStopped { audio_end_ms } => Some(TranslationEvent::SpeechStopped {
                audio_ms: audio_end_ms,
            }),
            Self::ResponseCreated { response } => Some(TranslationEvent::ResponseCreated {
                response_id: response.id,
            }),
            Self::AudioDelta { response_id, delta } => {
                Some(TranslationEvent::AudioDelta { delta, response_id })
            }
            Self::ResponseDone { response } => Some(TranslationEvent::ResponseDone {
                response_id: response.id,
            }),
            Self::Unknown => None,
        }
    }
}

/// Decode one text frame from the backend.
///
/// Malformed frames are logged and skipped; the leg stays open.
pub fn decode_server_event(text: &str) -> Option<TranslationEvent> {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => event.into_translation_event(),
        Err(e) => {
            tracing::warn!("Failed to parse server event: {}", e);
            None
        }
    }
}

// =============================================================================
// Supporting Types
// =============================================================================

/// API error information.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error code
    #[serde(default)]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseInfo {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::languages::LanguagePair;
    use crate::core::realtime::base::TranslationProfile;

    fn settings() -> SessionSettings {
        SessionSettings::new(&TranslationProfile::default(), &LanguagePair::default())
    }

    #[test]
    fn test_session_update_serialization() {
        let event = ClientEvent::from(TranslationCommand::Configure(Box::new(settings())));
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "session.update");
        let session = &json["session"];
        assert_eq!(session["modalities"], serde_json::json!(["text", "audio"]));
        assert_eq!(session["voice"], "alloy");
        assert_eq!(session["input_audio_format"], "g711_ulaw");
        assert_eq!(session["output_audio_format"], "g711_ulaw");
        assert_eq!(session["input_audio_transcription"]["model"], "whisper-1");
        assert_eq!(session["turn_detection"]["type"], "server_vad");
        assert_eq!(session["turn_detection"]["threshold"], 0.5);
        assert_eq!(session["turn_detection"]["prefix_padding_ms"], 300);
        assert_eq!(session["turn_detection"]["silence_duration_ms"], 600);
        assert_eq!(session["turn_detection"]["create_response"], false);
        assert_eq!(session["turn_detection"]["interrupt_response"], false);
        assert_eq!(session["max_response_output_tokens"], 150);
    }

    #[test]
    fn test_transcription_omitted_when_disabled() {
        let mut settings = settings();
        settings.transcription_model = None;
        let event = ClientEvent::from(TranslationCommand::Configure(Box::new(settings)));
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["session"].get("input_audio_transcription").is_none());
    }

    #[test]
    fn test_simple_client_events() {
        let append = ClientEvent::from(TranslationCommand::AppendAudio("AAEC".to_string()));
        assert_eq!(
            serde_json::to_string(&append).unwrap(),
            r#"{"type":"input_audio_buffer.append","audio":"AAEC"}"#
        );
        assert_eq!(
            serde_json::to_string(&ClientEvent::ResponseCreate).unwrap(),
            r#"{"type":"response.create"}"#
        );
        assert_eq!(
            serde_json::to_string(&ClientEvent::ResponseCancel).unwrap(),
            r#"{"type":"response.cancel"}"#
        );
    }

    #[test]
    fn test_decode_audio_delta_both_names() {
        let legacy = r#"{"type":"response.audio.delta","response_id":"resp_1","item_id":"i","output_index":0,"content_index":0,"delta":"UklG"}"#;
        assert_eq!(
            decode_server_event(legacy),
            Some(TranslationEvent::AudioDelta {
                delta: "UklG".to_string(),
                response_id: Some("resp_1".to_string()),
            })
        );

        let current = r#"{"type":"response.output_audio.delta","delta":"UklG"}"#;
        assert_eq!(
            decode_server_event(current),
            Some(TranslationEvent::AudioDelta {
                delta: "UklG".to_string(),
                response_id: None,
            })
        );
    }

    #[test]
    fn test_decode_turn_events() {
        assert_eq!(
            decode_server_event(
                r#"{"type":"input_audio_buffer.speech_started","audio_start_ms":1200,"item_id":"x"}"#
            ),
            Some(TranslationEvent::SpeechStarted { audio_ms: 1200 })
        );
        assert_eq!(
            decode_server_event(r#"{"type":"input_audio_buffer.speech_stopped","audio_end_ms":2400}"#),
            Some(TranslationEvent::SpeechStopped { audio_ms: 2400 })
        );
        assert_eq!(
            decode_server_event(
                r#"{"type":"response.done","response":{"id":"resp_9","status":"cancelled","output":[]}}"#
            ),
            Some(TranslationEvent::ResponseDone {
                response_id: "resp_9".to_string()
            })
        );
    }

    #[test]
    fn test_decode_session_events() {
        assert_eq!(
            decode_server_event(
                r#"{"type":"session.created","session":{"id":"sess_1","model":"gpt-4o"}}"#
            ),
            Some(TranslationEvent::SessionCreated {
                session_id: "sess_1".to_string()
            })
        );
        assert_eq!(
            decode_server_event(r#"{"type":"session.updated","session":{"id":"sess_1"}}"#),
            Some(TranslationEvent::SessionUpdated)
        );
    }

    #[test]
    fn test_decode_error_event() {
        let json = r#"{"type":"error","error":{"type":"invalid_request_error","code":"bad_value","message":"nope"}}"#;
        assert_eq!(
            decode_server_event(json),
            Some(TranslationEvent::Error {
                code: Some("bad_value".to_string()),
                message: "nope".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_and_malformed_events_are_skipped() {
        assert_eq!(
            decode_server_event(r#"{"type":"response.audio_transcript.delta","delta":"hola"}"#),
            None
        );
        assert_eq!(decode_server_event("not json"), None);
        assert_eq!(decode_server_event(r#"{"no_type":true}"#), None);
    }
}
