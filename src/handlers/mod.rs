//! HTTP and WebSocket request handlers
//!
//! - `api` - banner and health check
//! - `voice` - Twilio voice webhook returning TwiML
//! - `media_stream` - Twilio media stream WebSocket relay

pub mod api;
pub mod media_stream;
pub mod voice;

pub use media_stream::media_stream_handler;
