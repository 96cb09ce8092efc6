pub mod languages;
pub mod realtime;
pub mod registry;
pub mod relay;
pub mod telephony;

pub use languages::{Language, LanguagePair, supported_language_codes};
pub use realtime::{
    OpenAIConnector, TranslationConnector, TranslationError, TranslationEvent, TranslationLeg,
    TranslationProfile, TranslationResult,
};
pub use registry::CallRegistry;
pub use relay::{RelayContext, RelaySession, TelephonyRoute, run_relay};
