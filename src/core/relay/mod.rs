//! Duplex audio relay between the telephony leg and the translation leg.
//!
//! - [`session`]: per-call state machine, socket free
//! - [`turn`]: barge-in and response arbitration
//! - [`progress`]: playback markers
//! - [`driver`]: the task that owns both legs of a call

pub mod driver;
pub mod progress;
pub mod session;
pub mod turn;

pub use driver::{RelayContext, TelephonyRoute, run_relay};
pub use progress::{MARK_INTERVAL, ProgressMarker};
pub use session::{LegStatus, RelayCommand, RelaySession, RelayStats};
pub use turn::{TurnAction, TurnController, TurnState};
