//! Rate-limited playback progress markers.

use std::time::{Duration, Instant};

/// Minimum spacing between two markers on one call.
pub const MARK_INTERVAL: Duration = Duration::from_millis(1000);

/// Emits `m_<n>` marker names at most once per [`MARK_INTERVAL`].
#[derive(Debug, Default)]
pub struct ProgressMarker {
    last_mark: Option<Instant>,
    sequence: u64,
}

impl ProgressMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every forwarded audio chunk. Returns a marker name when one
    /// is due: on the first chunk, and then once the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = match self.last_mark {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= MARK_INTERVAL,
        };
        if !due {
            return None;
        }
        self.last_mark = Some(now);
        self.sequence += 1;
        Some(format!("m_{}", self.sequence))
    }
}
