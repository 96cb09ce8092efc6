//! Twilio media stream WebSocket
//!
//! Twilio opens this socket after the `<Connect><Stream>` TwiML verb and sends
//! JSON text frames: `connected`, `start`, `media`, `mark` and `stop`. The
//! gateway answers with `media`, `mark` and `clear` frames on the same socket.
//! Each socket is relayed to one translation leg by
//! [`run_relay`](crate::core::relay::run_relay).

mod handler;

pub use handler::media_stream_handler;
