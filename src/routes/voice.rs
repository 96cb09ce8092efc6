use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::voice::voice_webhook;
use crate::state::AppState;
use std::sync::Arc;

/// Twilio voice webhook
///
/// `POST /voice?source=es&target=en` with the form-encoded call parameters.
/// Responds with TwiML connecting the call to the media stream endpoint.
pub fn create_voice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voice", post(voice_webhook))
        .layer(TraceLayer::new_for_http())
}
