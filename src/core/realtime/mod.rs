//! Streaming speech-translation backends.
//!
//! The relay drives a translation leg through the provider-agnostic
//! [`TranslationConnector`] / [`TranslationLeg`] seam defined in `base`.
//! Providers translate that protocol onto their own wire format.
//!
//! # Supported Providers
//!
//! - **OpenAI Realtime API** - duplex G.711 audio with server-side VAD
//!
//! # Audio Format
//!
//! Base64 G.711 mu-law at 8kHz in both directions.

mod base;
pub mod openai;

pub use base::{
    LEG_CHANNEL_CAPACITY, SessionSettings, TranslationCommand, TranslationConnector,
    TranslationError, TranslationEvent, TranslationLeg, TranslationProfile, TranslationResult,
    VadSettings, translation_instructions,
};
pub use openai::{OpenAIConnector, OpenAIRealtimeVoice};
