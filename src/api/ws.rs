// =============================================================================
// WebSocket Handler — Push-based session updates
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. An immediate full SessionSnapshot on connect.
//   2. A fresh snapshot whenever `state_version` has changed since the last
//      push, checked every 500 ms.
//
// Ping frames are answered with Pong; any text frame is treated as a request
// to resend the current snapshot.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::app_state::AppState;

const PUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Axum handler for the WebSocket upgrade request.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("WebSocket connection accepted — upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Runs the push loop and the receive loop for one connection until either
/// side fails or the client closes.
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut sequence: u64 = 0;
    let mut last_sent_version = match send_snapshot(&mut sender, &state, &mut sequence).await {
        Ok(version) => version,
        Err(e) => {
            warn!(error = %e, "failed to send initial WebSocket snapshot");
            return;
        }
    };

    let mut push_interval = interval(PUSH_INTERVAL);

    loop {
        tokio::select! {
            _ = push_interval.tick() => {
                if state.current_state_version() == last_sent_version {
                    continue;
                }
                match send_snapshot(&mut sender, &state, &mut sequence).await {
                    Ok(version) => last_sent_version = version,
                    Err(e) => {
                        debug!(error = %e, "WebSocket send failed — disconnecting");
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(_))) => {
                        debug!("snapshot requested by client");
                        match send_snapshot(&mut sender, &state, &mut sequence).await {
                            Ok(version) => last_sent_version = version,
                            Err(e) => {
                                debug!(error = %e, "WebSocket send failed — disconnecting");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "failed to send Pong — disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received — disconnecting");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error — disconnecting");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!(messages = sequence, "WebSocket connection closed");
}

/// Serialize and send the current snapshot, returning the version it carried.
async fn send_snapshot<S>(
    sender: &mut S,
    state: &AppState,
    sequence: &mut u64,
) -> Result<u64, axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let snapshot = state.build_snapshot();
    let version = snapshot.state_version;

    match serde_json::to_string(&snapshot) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            *sequence += 1;
            debug!(version, seq = *sequence, "WebSocket snapshot sent");
        }
        // Not a network error; keep the connection.
        Err(e) => warn!(error = %e, "failed to serialize snapshot"),
    }
    Ok(version)
}
