use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt, future};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::core::relay::{TelephonyRoute, run_relay};
use crate::middleware::ClientIp;
use crate::state::AppState;

/// Outbound frames queued per call before the relay waits on the socket
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Twilio media frames are small; anything near this is not a media stream.
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Upgrade `GET /media-stream` and relay the call.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    let client_ip = client_ip.map(|Extension(ip)| ip);
    debug!(ip = ?client_ip.as_ref().map(|c| c.0), "Media stream upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_stream(socket, state, client_ip))
}

async fn handle_media_stream(socket: WebSocket, state: Arc<AppState>, client_ip: Option<ClientIp>) {
    let _session_guard = state.track_session();
    info!("Media stream connection established");

    let (mut sender, receiver) = socket.split();
    let (route_tx, mut route_rx) = mpsc::channel::<TelephonyRoute>(CHANNEL_BUFFER_SIZE);

    let mut sender_task = tokio::spawn(async move {
        while let Some(route) = route_rx.recv().await {
            let result = match route {
                TelephonyRoute::Frame(frame) => match serde_json::to_string(&frame) {
                    Ok(json) => sender.send(Message::Text(json.into())).await,
                    Err(e) => {
                        error!("Failed to serialize media stream frame: {}", e);
                        continue;
                    }
                },
                TelephonyRoute::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if let Err(e) = result {
                debug!("Media stream socket send failed: {}", e);
                break;
            }
        }
    });

    let inbound = receiver
        .take_while(|msg| future::ready(matches!(msg, Ok(m) if !matches!(m, Message::Close(_)))))
        .filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(text.as_str().to_owned()),
                _ => None,
            })
        });

    let stats = run_relay(Box::pin(inbound), route_tx, state.relay_context()).await;

    // The relay dropped its sender, so the writer drains and exits on its own
    // unless the socket is stuck.
    if tokio::time::timeout(std::time::Duration::from_secs(5), &mut sender_task)
        .await
        .is_err()
    {
        sender_task.abort();
    }

    if let Some(ClientIp(ip)) = client_ip {
        state.release_connection(ip);
    }

    info!(stats = ?stats, "Media stream connection closed");
}
