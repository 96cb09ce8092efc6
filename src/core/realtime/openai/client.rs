//! OpenAI Realtime translation leg.
//!
//! Each [`OpenAIConnector::connect`] opens one WebSocket to the Realtime API
//! and splits it into two tasks:
//!
//! - a writer that serializes [`TranslationCommand`]s and sends a close frame
//!   once the relay drops its command sender
//! - a reader that decodes server events into [`TranslationEvent`]s
//!
//! There is no reconnection. When the socket ends the event channel closes and
//! the relay tears the call down.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use http::HeaderValue;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use url::Url;
use zeroize::Zeroize;

use super::config::{DEFAULT_OPENAI_REALTIME_MODEL, OPENAI_BETA_HEADER, OPENAI_REALTIME_URL};
use super::messages::{ClientEvent, decode_server_event};
use crate::core::realtime::base::{
    LEG_CHANNEL_CAPACITY, TranslationCommand, TranslationConnector, TranslationError,
    TranslationEvent, TranslationLeg, TranslationResult,
};

/// Serialize a relay command into its Realtime client event.
pub(crate) fn encode_command(command: TranslationCommand) -> TranslationResult<String> {
    serde_json::to_string(&ClientEvent::from(command))
        .map_err(|e| TranslationError::SerializationError(e.to_string()))
}

/// Opens translation legs against the OpenAI Realtime API.
pub struct OpenAIConnector {
    url: String,
    model: String,
    api_key: String,
}

impl OpenAIConnector {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_OPENAI_REALTIME_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Override the endpoint (used for proxies and local mock servers).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Endpoint with the `model` query parameter applied.
    fn build_ws_url(&self) -> TranslationResult<String> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            TranslationError::InvalidConfiguration(format!("Invalid realtime URL: {e}"))
        })?;
        url.query_pairs_mut().append_pair("model", &self.model);
        Ok(url.into())
    }

    fn build_request(&self) -> TranslationResult<http::Request<()>> {
        let url = self.build_ws_url()?;
        let mut request = url
            .into_client_request()
            .map_err(|e| TranslationError::ConnectionFailed(e.to_string()))?;

        let authorization = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| {
                TranslationError::InvalidConfiguration("API key is not a valid header".into())
            })?;
        let headers = request.headers_mut();
        headers.insert(http::header::AUTHORIZATION, authorization);
        headers.insert("OpenAI-Beta", HeaderValue::from_static(OPENAI_BETA_HEADER));
        Ok(request)
    }
}

impl Drop for OpenAIConnector {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

#[async_trait]
impl TranslationConnector for OpenAIConnector {
    fn provider(&self) -> &'static str {
        "openai"
    }

    async fn connect(&self) -> TranslationResult<TranslationLeg> {
        if self.api_key.is_empty() {
            return Err(TranslationError::AuthenticationFailed(
                "OpenAI API key is not configured".into(),
            ));
        }

        let request = self.build_request()?;
        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| match e {
                tokio_tungstenite::tungstenite::Error::Http(response)
                    if response.status() == http::StatusCode::UNAUTHORIZED =>
                {
                    TranslationError::AuthenticationFailed("Rejected by OpenAI".into())
                }
                other => TranslationError::ConnectionFailed(other.to_string()),
            })?;

        tracing::info!(model = %self.model, "Connected to OpenAI Realtime API");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (command_tx, mut command_rx) = mpsc::channel::<TranslationCommand>(LEG_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<TranslationEvent>(LEG_CHANNEL_CAPACITY);

        // Writer: ends with a close frame when the relay drops the leg.
        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let json = match encode_command(command) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::error!("Dropping command: {}", e);
                        continue;
                    }
                };
                if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                    tracing::debug!("OpenAI socket no longer writable: {}", e);
                    return;
                }
            }
            if let Err(e) = ws_sink.send(Message::Close(None)).await {
                tracing::debug!("Failed to send close frame: {}", e);
            }
        });

        let reader = tokio::spawn(async move {
            while let Some(msg) = ws_stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Some(event) = decode_server_event(&text)
                            && event_tx.send(event).await.is_err()
                        {
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        tracing::info!(?frame, "OpenAI closed the realtime socket");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("OpenAI realtime socket error: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(TranslationLeg::new(command_tx, event_rx).with_reader(reader))
    }
}
