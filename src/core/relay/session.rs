//! Per-call relay state.
//!
//! [`RelaySession`] is a synchronous state machine. It consumes telephony and
//! translation events and returns the [`RelayCommand`]s the driver must apply,
//! which keeps every ordering rule testable without sockets.

use std::collections::HashSet;
use std::time::Instant;

use crate::core::languages::LanguagePair;
use crate::core::realtime::{
    SessionSettings, TranslationCommand, TranslationEvent, TranslationProfile,
};
use crate::core::telephony::TelephonyOutbound;

use super::progress::ProgressMarker;
use super::turn::{TurnAction, TurnController, TurnState};

/// Lifecycle of the translation leg as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegStatus {
    /// Connecting, or connected but not yet configured
    Pending,
    /// Configured; caller audio may flow
    Ready,
    Closed,
}

/// Side effect requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayCommand {
    Telephony(TelephonyOutbound),
    Translation(TranslationCommand),
    CloseTranslation,
    CloseTelephony,
}

/// Per-call counters, logged at teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub audio_frames_in: u64,
    pub audio_frames_dropped: u64,
    pub audio_chunks_out: u64,
    pub audio_chunks_dropped: u64,
    pub responses_requested: u64,
    pub barge_ins: u64,
    pub marks: u64,
}

pub struct RelaySession {
    session_id: String,
    stream_sid: String,
    call_sid: Option<String>,
    languages: LanguagePair,
    settings: SessionSettings,
    leg: LegStatus,
    turn: TurnController,
    progress: ProgressMarker,
    current_response: Option<String>,
    /// Responses cancelled by a barge-in whose `response.done` is still due
    cancelled_responses: HashSet<String>,
    /// A barge-in hit a response whose `response.created` had not arrived yet
    cancel_pending: bool,
    stats: RelayStats,
}

impl RelaySession {
    pub fn new(
        stream_sid: impl Into<String>,
        call_sid: Option<String>,
        languages: LanguagePair,
        profile: &TranslationProfile,
    ) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            stream_sid: stream_sid.into(),
            call_sid,
            settings: SessionSettings::new(profile, &languages),
            languages,
            leg: LegStatus::Pending,
            turn: TurnController::new(),
            progress: ProgressMarker::new(),
            current_response: None,
            cancelled_responses: HashSet::new(),
            cancel_pending: false,
            stats: RelayStats::default(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn stream_sid(&self) -> &str {
        &self.stream_sid
    }

    pub fn call_sid(&self) -> Option<&str> {
        self.call_sid.as_deref()
    }

    pub fn languages(&self) -> LanguagePair {
        self.languages
    }

    pub fn leg_status(&self) -> LegStatus {
        self.leg
    }

    pub fn is_leg_ready(&self) -> bool {
        self.leg == LegStatus::Ready
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn.state()
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// The translation leg connected. Sends the one-time configuration and
    /// opens the inbound audio path.
    pub fn on_translation_open(&mut self) -> Vec<RelayCommand> {
        if self.leg != LegStatus::Pending {
            return Vec::new();
        }
        self.leg = LegStatus::Ready;
        tracing::info!(
            session_id = %self.session_id,
            stream_sid = %self.stream_sid,
            languages = %self.languages,
            "Translation leg ready"
        );
        vec![RelayCommand::Translation(TranslationCommand::Configure(
            Box::new(self.settings.clone()),
        ))]
    }

    /// Caller audio from telephony. Dropped until the leg is ready.
    pub fn on_inbound_media(&mut self, payload: String) -> Option<RelayCommand> {
        if self.leg != LegStatus::Ready {
            self.stats.audio_frames_dropped += 1;
            return None;
        }
        self.stats.audio_frames_in += 1;
        Some(RelayCommand::Translation(TranslationCommand::AppendAudio(
            payload,
        )))
    }

    pub fn on_translation_event(
        &mut self,
        event: TranslationEvent,
        now: Instant,
    ) -> Vec<RelayCommand> {
        match event {
            TranslationEvent::AudioDelta { delta, response_id } => {
                self.on_audio_delta(delta, response_id, now)
            }
            TranslationEvent::SpeechStarted { audio_ms } => {
                tracing::debug!(session_id = %self.session_id, audio_ms, "Speech started");
                match self.turn.on_speech_started() {
                    TurnAction::BargeIn => {
                        self.stats.barge_ins += 1;
                        let cancelled = self.current_response.take();
                        tracing::info!(
                            session_id = %self.session_id,
                            response_id = ?cancelled,
                            "Caller barged in, cancelling response"
                        );
                        match cancelled {
                            Some(id) => {
                                self.cancelled_responses.insert(id);
                            }
                            None => self.cancel_pending = true,
                        }
                        vec![
                            RelayCommand::Telephony(TelephonyOutbound::clear(&self.stream_sid)),
                            RelayCommand::Translation(TranslationCommand::CancelResponse),
                        ]
                    }
                    _ => Vec::new(),
                }
            }
            TranslationEvent::SpeechStopped { audio_ms } => {
                tracing::debug!(session_id = %self.session_id, audio_ms, "Speech stopped");
                match self.turn.on_speech_stopped() {
                    TurnAction::RequestResponse => {
                        self.stats.responses_requested += 1;
                        self.current_response = None;
                        vec![RelayCommand::Translation(
                            TranslationCommand::CreateResponse,
                        )]
                    }
                    _ => Vec::new(),
                }
            }
            TranslationEvent::ResponseCreated { response_id } => {
                tracing::debug!(session_id = %self.session_id, %response_id, "Response created");
                if self.cancel_pending {
                    // The response the caller interrupted; the earlier cancel
                    // may have reached the backend before the response existed.
                    self.cancel_pending = false;
                    self.cancelled_responses.insert(response_id);
                    return vec![RelayCommand::Translation(TranslationCommand::CancelResponse)];
                }
                if self.turn.is_responding() {
                    self.current_response = Some(response_id);
                }
                Vec::new()
            }
            TranslationEvent::ResponseDone { response_id } => {
                if self.cancelled_responses.remove(&response_id) {
                    // Barge-in already returned the turn to idle; a newer
                    // response may be in flight by now.
                } else if self.cancel_pending
                    && self.current_response.as_deref() != Some(response_id.as_str())
                {
                    // Interrupted response ended before it was ever announced.
                    self.cancel_pending = false;
                } else {
                    self.turn.on_response_done();
                    self.current_response = None;
                }
                tracing::debug!(session_id = %self.session_id, %response_id, "Response done");
                Vec::new()
            }
            TranslationEvent::SessionCreated { session_id } => {
                tracing::debug!(
                    session_id = %self.session_id,
                    backend_session = %session_id,
                    "Translation session created"
                );
                Vec::new()
            }
            TranslationEvent::SessionUpdated => {
                tracing::debug!(session_id = %self.session_id, "Translation session configured");
                Vec::new()
            }
            TranslationEvent::Error { code, message } => {
                tracing::error!(
                    session_id = %self.session_id,
                    code = ?code,
                    "Translation backend error: {}",
                    message
                );
                Vec::new()
            }
        }
    }

    fn on_audio_delta(
        &mut self,
        delta: String,
        response_id: Option<String>,
        now: Instant,
    ) -> Vec<RelayCommand> {
        let cancelled = response_id
            .as_ref()
            .is_some_and(|id| self.cancelled_responses.contains(id));
        if !self.turn.is_responding() || cancelled {
            self.stats.audio_chunks_dropped += 1;
            return Vec::new();
        }

        self.stats.audio_chunks_out += 1;
        let mut commands = vec![RelayCommand::Telephony(TelephonyOutbound::media(
            &self.stream_sid,
            delta,
        ))];
        if let Some(name) = self.progress.poll(now) {
            self.stats.marks += 1;
            commands.push(RelayCommand::Telephony(TelephonyOutbound::mark(
                &self.stream_sid,
                name,
            )));
        }
        commands
    }

    /// The translation leg closed or failed to open. Ends the call.
    pub fn on_translation_closed(&mut self) -> Vec<RelayCommand> {
        self.leg = LegStatus::Closed;
        self.turn.reset();
        self.current_response = None;
        self.cancelled_responses.clear();
        self.cancel_pending = false;
        vec![RelayCommand::CloseTelephony]
    }

    /// Telephony sent `stop`.
    pub fn on_stop(&mut self) -> Vec<RelayCommand> {
        self.leg = LegStatus::Closed;
        vec![RelayCommand::CloseTranslation, RelayCommand::CloseTelephony]
    }

    /// The telephony socket went away.
    pub fn on_telephony_closed(&mut self) -> Vec<RelayCommand> {
        self.leg = LegStatus::Closed;
        vec![RelayCommand::CloseTranslation]
    }
}
