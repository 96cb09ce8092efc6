//! Mock Provider Servers
//!
//! In-process stand-ins for the translation backend, bound to an ephemeral
//! localhost port.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod websocket_mock;

pub use websocket_mock::{MockRealtimeServer, ReceivedFrame};
