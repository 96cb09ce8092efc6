//! Turn-taking controller.
//!
//! Decides, from the backend's speech events, when the translated voice may
//! speak and when it must yield to the caller.

/// Whether a translated utterance is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    /// A response was requested and has not completed or been cancelled.
    Responding,
}

/// What the relay must do after feeding an event to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction {
    None,
    /// Ask the backend for a translated utterance.
    RequestResponse,
    /// Flush telephony playback and cancel the in-flight response.
    BargeIn,
}

#[derive(Debug, Default)]
pub struct TurnController {
    state: TurnState,
}

impl TurnController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> TurnState {
        self.state
    }

    #[inline]
    pub fn is_responding(&self) -> bool {
        self.state == TurnState::Responding
    }

    /// Caller started talking. Interrupts a response that is playing.
    pub fn on_speech_started(&mut self) -> TurnAction {
        match self.state {
            TurnState::Responding => {
                // Interrupted collapses straight back to idle.
                self.state = TurnState::Idle;
                TurnAction::BargeIn
            }
            TurnState::Idle => TurnAction::None,
        }
    }

    /// Caller finished a turn. Requests at most one response at a time.
    pub fn on_speech_stopped(&mut self) -> TurnAction {
        match self.state {
            TurnState::Idle => {
                self.state = TurnState::Responding;
                TurnAction::RequestResponse
            }
            TurnState::Responding => TurnAction::None,
        }
    }

    /// Response completed, was cancelled, or failed.
    pub fn on_response_done(&mut self) {
        self.state = TurnState::Idle;
    }

    pub fn reset(&mut self) {
        self.state = TurnState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_stopped_requests_once() {
        let mut turn = TurnController::new();
        assert_eq!(turn.on_speech_stopped(), TurnAction::RequestResponse);
        assert!(turn.is_responding());
        assert_eq!(turn.on_speech_stopped(), TurnAction::None);
        assert!(turn.is_responding());
    }

    #[test]
    fn test_speech_started_barges_in_only_while_responding() {
        let mut turn = TurnController::new();
        assert_eq!(turn.on_speech_started(), TurnAction::None);
        assert_eq!(turn.state(), TurnState::Idle);

        turn.on_speech_stopped();
        assert_eq!(turn.on_speech_started(), TurnAction::BargeIn);
        assert_eq!(turn.state(), TurnState::Idle);
    }

    #[test]
    fn test_response_done_returns_to_idle_from_any_state() {
        let mut turn = TurnController::new();
        turn.on_response_done();
        assert_eq!(turn.state(), TurnState::Idle);

        turn.on_speech_stopped();
        turn.on_response_done();
        assert_eq!(turn.state(), TurnState::Idle);
        assert_eq!(turn.on_speech_stopped(), TurnAction::RequestResponse);
    }
}
