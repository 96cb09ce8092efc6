//! Base traits and types for the translation leg.
//!
//! A translation leg is one streaming connection to a speech-translation
//! backend. The relay talks to it in provider-agnostic terms: it pushes
//! [`TranslationCommand`]s and pulls [`TranslationEvent`]s. Provider modules
//! (currently only OpenAI Realtime) map these onto their wire protocol.
//!
//! # Audio Format
//!
//! Payloads are base64 strings and are never decoded on the relay path. Both
//! directions carry 8kHz G.711 mu-law, the codec of the telephony leg.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::languages::LanguagePair;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur on a translation leg.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// Connection to the backend failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The leg is closed
    #[error("Not connected")]
    NotConnected,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for translation leg operations.
pub type TranslationResult<T> = Result<T, TranslationError>;

// =============================================================================
// Configuration Types
// =============================================================================

/// Server-side voice activity detection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VadSettings {
    /// Activation threshold (0.0 to 1.0)
    pub threshold: f32,
    /// Audio kept before detected speech (ms)
    pub prefix_padding_ms: u32,
    /// Silence that ends a turn (ms)
    pub silence_duration_ms: u32,
}

impl Default for VadSettings {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 600,
        }
    }
}

/// Voice and generation parameters shared by every call.
///
/// Loaded once from configuration; combined with a call's [`LanguagePair`]
/// into [`SessionSettings`] when the leg opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationProfile {
    /// Synthesized voice name
    pub voice: String,
    /// Response temperature
    pub temperature: f32,
    /// Cap on response length in tokens
    pub max_response_output_tokens: u32,
    /// Turn detection parameters
    pub vad: VadSettings,
    /// Input transcription model, `None` disables caller transcripts
    pub transcription_model: Option<String>,
}

impl Default for TranslationProfile {
    fn default() -> Self {
        Self {
            voice: "alloy".to_string(),
            temperature: 0.7,
            max_response_output_tokens: 150,
            vad: VadSettings::default(),
            transcription_model: Some("whisper-1".to_string()),
        }
    }
}

/// Fully resolved configuration sent once when a leg opens.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub instructions: String,
    pub voice: String,
    pub temperature: f32,
    pub max_response_output_tokens: u32,
    pub vad: VadSettings,
    pub transcription_model: Option<String>,
}

impl SessionSettings {
    pub fn new(profile: &TranslationProfile, languages: &LanguagePair) -> Self {
        Self {
            instructions: translation_instructions(languages),
            voice: profile.voice.clone(),
            temperature: profile.temperature,
            max_response_output_tokens: profile.max_response_output_tokens,
            vad: profile.vad,
            transcription_model: profile.transcription_model.clone(),
        }
    }
}

/// Build the interpreter instruction for a language pair.
pub fn translation_instructions(languages: &LanguagePair) -> String {
    let source = languages.source.name();
    let target = languages.target.name();
    format!(
        "You are a real-time interpreter on a phone call between a {source} speaker \
         and a {target} speaker. When you hear {source}, speak the translation in \
         {target}. When you hear {target}, speak the translation in {source}. \
         Output ONLY the translation and speak naturally. Do not add commentary, \
         do not answer questions yourself, and never use reported speech such as \
         \"he says\" or \"she said\"."
    )
}

// =============================================================================
// Leg Protocol
// =============================================================================

/// Commands the relay sends to a translation leg.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationCommand {
    /// One-time session configuration
    Configure(Box<SessionSettings>),
    /// Append base64 caller audio to the input buffer
    AppendAudio(String),
    /// Ask the backend for a translated utterance
    CreateResponse,
    /// Cancel the utterance in flight
    CancelResponse,
}

/// Events a translation leg delivers to the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationEvent {
    /// Backend accepted the connection
    SessionCreated { session_id: String },
    /// Backend applied the configuration
    SessionUpdated,
    /// Caller started speaking
    SpeechStarted { audio_ms: u64 },
    /// Caller stopped speaking
    SpeechStopped { audio_ms: u64 },
    /// A response began
    ResponseCreated { response_id: String },
    /// Chunk of synthesized audio (base64)
    AudioDelta {
        delta: String,
        response_id: Option<String>,
    },
    /// A response completed, was cancelled, or failed
    ResponseDone { response_id: String },
    /// Backend reported an error; the leg stays open
    Error {
        code: Option<String>,
        message: String,
    },
}

/// Channel capacity between the relay and a leg's I/O tasks.
pub const LEG_CHANNEL_CAPACITY: usize = 256;

/// Handle to an open translation leg.
///
/// The leg is closed when this handle is closed or dropped. Releasing the
/// command channel makes the provider's writer task send a close frame; the
/// reader task is aborted.
pub struct TranslationLeg {
    commands: mpsc::Sender<TranslationCommand>,
    events: mpsc::Receiver<TranslationEvent>,
    reader: Option<JoinHandle<()>>,
}

impl TranslationLeg {
    pub fn new(
        commands: mpsc::Sender<TranslationCommand>,
        events: mpsc::Receiver<TranslationEvent>,
    ) -> Self {
        Self {
            commands,
            events,
            reader: None,
        }
    }

    /// Attach the task that reads from the backend connection.
    pub fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Queue a command for the backend.
    pub async fn send(&self, command: TranslationCommand) -> TranslationResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TranslationError::NotConnected)
    }

    /// Next event from the backend; `None` once the leg has closed.
    pub async fn next_event(&mut self) -> Option<TranslationEvent> {
        self.events.recv().await
    }

    /// Whether the provider side has gone away.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Close the leg.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for TranslationLeg {
    fn drop(&mut self) {
        self.events.close();
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Opens translation legs.
///
/// The relay holds one connector for the whole process and calls it once per
/// call. Implementations must not send anything on the new leg; the relay
/// sends [`TranslationCommand::Configure`] itself.
#[async_trait]
pub trait TranslationConnector: Send + Sync {
    /// Provider name, for logs and health output.
    fn provider(&self) -> &'static str;

    /// Open a new leg.
    async fn connect(&self) -> TranslationResult<TranslationLeg>;
}
