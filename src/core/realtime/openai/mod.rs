//! OpenAI Realtime translation provider.
//!
//! Audio flows in both directions as base64 G.711 mu-law at 8kHz, the same
//! codec Twilio streams, so the relay never transcodes.
//!
//! # Example
//!
//! ```rust,ignore
//! use calldove_gateway::core::realtime::{OpenAIConnector, TranslationConnector};
//!
//! let connector = OpenAIConnector::new("sk-...");
//! let mut leg = connector.connect().await?;
//! while let Some(event) = leg.next_event().await {
//!     // ...
//! }
//! ```

mod client;
mod config;
mod messages;

pub use client::OpenAIConnector;
pub use config::{
    DEFAULT_OPENAI_REALTIME_MODEL, Modality, OPENAI_BETA_HEADER, OPENAI_REALTIME_URL,
    OpenAIRealtimeVoice, TELEPHONY_AUDIO_FORMAT,
};
pub use messages::{ClientEvent, ServerEvent, SessionConfig, TurnDetection, decode_server_event};
