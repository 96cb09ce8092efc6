//! Twilio voice webhook.
//!
//! Twilio POSTs the call parameters form-encoded when a call arrives. The
//! handler records the call's language pair and answers with TwiML that
//! connects the call audio to `/media-stream`.

use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::languages::{Language, LanguagePair, supported_language_codes};
use crate::core::telephony::{connect_stream_response, media_stream_url};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub const TWIML_CONTENT_TYPE: &str = "text/xml";

#[derive(Debug, Default, Deserialize)]
pub struct VoiceQuery {
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoiceForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

pub async fn voice_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VoiceQuery>,
    headers: HeaderMap,
    Form(form): Form<VoiceForm>,
) -> AppResult<impl IntoResponse> {
    let call_sid = form
        .call_sid
        .map(|sid| sid.trim().to_string())
        .filter(|sid| !sid.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing CallSid".to_string()))?;

    for code in [query.source.as_deref(), query.target.as_deref()]
        .into_iter()
        .flatten()
    {
        if Language::from_code(code).is_none() {
            warn!(
                call_sid = %call_sid,
                code = %code,
                supported = ?supported_language_codes(),
                "Unsupported language code, using default"
            );
        }
    }
    let languages = LanguagePair::resolve(query.source.as_deref(), query.target.as_deref());

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let public_base_url = state.config.public_base_url.as_deref();
    let stream_url = media_stream_url(public_base_url, host).map_err(|e| {
        // A configured base URL is validated at startup; failing here is ours.
        if public_base_url.is_some() {
            AppError::Internal(e)
        } else {
            AppError::BadRequest(e)
        }
    })?;

    state.call_registry.put(call_sid.clone(), languages).await;

    info!(
        call_sid = %call_sid,
        languages = %languages,
        stream_url = %stream_url,
        "Incoming call registered"
    );

    Ok((
        [(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)],
        connect_stream_response(&stream_url, &call_sid),
    ))
}
