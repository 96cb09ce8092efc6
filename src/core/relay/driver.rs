//! Per-call relay task.
//!
//! One task owns both legs of a call and multiplexes them with a biased
//! `select!`: telephony frames first, then translation events, then the
//! result of the pending leg open. Every command a [`RelaySession`] returns is
//! applied before the next event is read, so events of one call are handled
//! strictly in order.

use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use super::session::{RelayCommand, RelaySession, RelayStats};
use crate::core::languages::LanguagePair;
use crate::core::realtime::{
    TranslationConnector, TranslationEvent, TranslationLeg, TranslationProfile,
    TranslationResult,
};
use crate::core::registry::CallRegistry;
use crate::core::telephony::{StreamStart, TelephonyInbound, TelephonyOutbound, decode_inbound};

/// What the relay hands to the telephony socket writer.
#[derive(Debug, Clone, PartialEq)]
pub enum TelephonyRoute {
    Frame(TelephonyOutbound),
    /// Close the socket after flushing queued frames
    Close,
}

/// Shared dependencies of every relay task.
#[derive(Clone)]
pub struct RelayContext {
    pub registry: CallRegistry,
    pub connector: Arc<dyn TranslationConnector>,
    pub profile: Arc<TranslationProfile>,
}

type PendingConnect = JoinHandle<TranslationResult<TranslationLeg>>;

enum RelayInput {
    Telephony(Option<String>),
    Translation(Option<TranslationEvent>),
    Connected(Result<TranslationResult<TranslationLeg>, JoinError>),
}

struct RelayDriver {
    ctx: RelayContext,
    telephony_out: mpsc::Sender<TelephonyRoute>,
    session: Option<RelaySession>,
    leg: Option<TranslationLeg>,
    connecting: Option<PendingConnect>,
    finished: bool,
}

/// Relay one call until either leg closes.
///
/// `telephony_in` yields the text frames of the telephony socket and ends when
/// that socket closes. Returns the session counters when a stream was started.
pub async fn run_relay<S>(
    mut telephony_in: S,
    telephony_out: mpsc::Sender<TelephonyRoute>,
    ctx: RelayContext,
) -> Option<RelayStats>
where
    S: Stream<Item = String> + Unpin,
{
    let mut driver = RelayDriver {
        ctx,
        telephony_out,
        session: None,
        leg: None,
        connecting: None,
        finished: false,
    };

    while !driver.finished {
        let input = tokio::select! {
            biased;
            frame = telephony_in.next() => RelayInput::Telephony(frame),
            event = next_leg_event(&mut driver.leg) => RelayInput::Translation(event),
            result = pending_connect(&mut driver.connecting) => RelayInput::Connected(result),
        };

        match input {
            RelayInput::Telephony(Some(text)) => driver.on_telephony_frame(&text).await,
            RelayInput::Telephony(None) => driver.on_telephony_closed().await,
            RelayInput::Translation(Some(event)) => {
                let commands = match driver.session.as_mut() {
                    Some(session) => session.on_translation_event(event, Instant::now()),
                    None => Vec::new(),
                };
                driver.apply(commands).await;
            }
            RelayInput::Translation(None) => {
                tracing::info!("Translation leg closed");
                driver.leg = None;
                driver.on_translation_closed().await;
            }
            RelayInput::Connected(result) => {
                driver.connecting = None;
                driver.on_connect_result(result).await;
            }
        }
    }

    driver.shutdown()
}

/// Next event of the open leg; never resolves while no leg is open.
async fn next_leg_event(leg: &mut Option<TranslationLeg>) -> Option<TranslationEvent> {
    match leg {
        Some(leg) => leg.next_event().await,
        None => std::future::pending().await,
    }
}

/// Result of the in-flight leg open; never resolves while none is pending.
async fn pending_connect(
    connecting: &mut Option<PendingConnect>,
) -> Result<TranslationResult<TranslationLeg>, JoinError> {
    match connecting {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

impl RelayDriver {
    async fn on_telephony_frame(&mut self, text: &str) {
        let Some(frame) = decode_inbound(text) else {
            return;
        };

        match frame {
            TelephonyInbound::Start { start } => self.on_start(start).await,
            TelephonyInbound::Media { media } => {
                let command = self
                    .session
                    .as_mut()
                    .and_then(|session| session.on_inbound_media(media.payload));
                if let Some(command) = command {
                    self.apply(vec![command]).await;
                }
            }
            TelephonyInbound::Stop {} => {
                tracing::info!(
                    stream_sid = ?self.session.as_ref().map(|s| s.stream_sid()),
                    "Telephony stream stopped"
                );
                let commands = match self.session.as_mut() {
                    Some(session) => session.on_stop(),
                    None => vec![RelayCommand::CloseTelephony],
                };
                self.apply(commands).await;
            }
            TelephonyInbound::Other => {}
        }
    }

    async fn on_start(&mut self, start: StreamStart) {
        if let Some(session) = &self.session {
            tracing::warn!(
                session_id = %session.session_id(),
                stream_sid = %start.stream_sid,
                "Ignoring duplicate start frame"
            );
            return;
        }

        let call_sid = start.resolved_call_sid().map(str::to_owned);
        let registered = match call_sid.as_deref() {
            Some(sid) => self.ctx.registry.take(sid).await,
            None => None,
        };
        let languages = registered.unwrap_or_else(|| {
            tracing::info!(
                call_sid = ?call_sid,
                "No languages registered for call, using default pair"
            );
            LanguagePair::default()
        });

        let session = RelaySession::new(start.stream_sid, call_sid, languages, &self.ctx.profile);
        tracing::info!(
            session_id = %session.session_id(),
            stream_sid = %session.stream_sid(),
            call_sid = ?session.call_sid(),
            languages = %languages,
            provider = self.ctx.connector.provider(),
            "Media stream started"
        );
        self.session = Some(session);

        let connector = self.ctx.connector.clone();
        self.connecting = Some(tokio::spawn(async move { connector.connect().await }));
    }

    async fn on_connect_result(&mut self, result: Result<TranslationResult<TranslationLeg>, JoinError>) {
        match result {
            Ok(Ok(leg)) => {
                self.leg = Some(leg);
                let commands = match self.session.as_mut() {
                    Some(session) => session.on_translation_open(),
                    None => Vec::new(),
                };
                self.apply(commands).await;
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to open translation leg: {}", e);
                self.on_translation_closed().await;
            }
            Err(e) => {
                tracing::error!("Translation connect task failed: {}", e);
                self.on_translation_closed().await;
            }
        }
    }

    async fn on_translation_closed(&mut self) {
        let commands = match self.session.as_mut() {
            Some(session) => session.on_translation_closed(),
            None => vec![RelayCommand::CloseTelephony],
        };
        self.apply(commands).await;
    }

    async fn on_telephony_closed(&mut self) {
        tracing::info!("Telephony socket closed");
        let commands = match self.session.as_mut() {
            Some(session) => session.on_telephony_closed(),
            None => Vec::new(),
        };
        self.apply(commands).await;
        self.finished = true;
    }

    async fn apply(&mut self, commands: Vec<RelayCommand>) {
        for command in commands {
            match command {
                RelayCommand::Telephony(frame) => {
                    self.send_telephony(TelephonyRoute::Frame(frame)).await;
                }
                RelayCommand::Translation(command) => {
                    if let Some(leg) = &self.leg
                        && let Err(e) = leg.send(command).await
                    {
                        tracing::debug!("Translation leg rejected command: {}", e);
                    }
                }
                RelayCommand::CloseTranslation => self.close_translation(),
                RelayCommand::CloseTelephony => {
                    self.send_telephony(TelephonyRoute::Close).await;
                    self.close_translation();
                    self.finished = true;
                }
            }
        }
    }

    async fn send_telephony(&self, route: TelephonyRoute) {
        if let Err(e) = self.telephony_out.send(route).await {
            // Writer is gone; the inbound half ends next.
            tracing::debug!(route = ?e.0, "Telephony writer closed, dropping route");
        }
    }

    fn close_translation(&mut self) {
        if let Some(handle) = self.connecting.take() {
            handle.abort();
        }
        if let Some(leg) = self.leg.take() {
            leg.close();
        }
    }

    fn shutdown(mut self) -> Option<RelayStats> {
        self.close_translation();
        let session = self.session.take()?;
        let stats = session.stats().clone();
        tracing::info!(
            session_id = %session.session_id(),
            stream_sid = %session.stream_sid(),
            audio_frames_in = stats.audio_frames_in,
            audio_chunks_out = stats.audio_chunks_out,
            barge_ins = stats.barge_ins,
            marks = stats.marks,
            "Relay session ended"
        );
        Some(stats)
    }
}
