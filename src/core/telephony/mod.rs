//! Telephony leg: Twilio media stream frames and call-setup TwiML.

pub mod messages;
pub mod twiml;

pub use messages::{
    CALL_SID_PARAMETER, InboundMedia, StreamStart, TelephonyInbound, TelephonyOutbound,
    decode_inbound,
};
pub use twiml::{MEDIA_STREAM_PATH, connect_stream_response, media_stream_url};
