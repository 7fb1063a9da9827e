//! Dashboard WebSocket feed. The client subscribes with a class/assignment
//! selection; the server pushes a freshly computed view immediately and then
//! after every collection delta (push-driven, never polled).

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::auth::require_teacher;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::SharedState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
  info!(target: "dashboard", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

struct Selection {
  class_id: Option<String>,
  assignment_id: Option<String>,
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: SharedState) {
  info!(target: "dashboard", "WebSocket connected");
  let mut deltas = state.store.subscribe();
  let mut selection: Option<Selection> = None;

  loop {
    tokio::select! {
      delta = deltas.recv() => {
        match delta {
          Ok(collection) => {
            // Any collection delta recomputes the subscribed pane.
            if let Some(sel) = &selection {
              debug!(target: "dashboard", ?collection, "Collection delta; pushing view");
              if !push_view(&mut socket, &state, sel).await {
                break;
              }
            }
          }
          Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
            // Tags are only "recompute" signals; push once and move on.
            debug!(target: "dashboard", missed, "Feed lagged; pushing fresh view");
            if let Some(sel) = &selection {
              if !push_view(&mut socket, &state, sel).await {
                break;
              }
            }
          }
          Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
      }
      msg = socket.recv() => {
        let Some(Ok(msg)) = msg else { break };
        match msg {
          Message::Text(txt) => {
            let reply = match serde_json::from_str::<ClientWsMessage>(&txt) {
              Ok(ClientWsMessage::Ping) => Some(ServerWsMessage::Pong),
              Ok(ClientWsMessage::Subscribe { teacher_key, class_id, assignment_id }) => {
                match require_teacher(&state.config, &state.store, teacher_key.as_deref(), None).await {
                  Ok(()) => {
                    selection = Some(Selection { class_id, assignment_id });
                    None // the immediate push below answers the subscribe
                  }
                  Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
                }
              }
              Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
            };

            if let Some(reply) = reply {
              if !send(&mut socket, &reply).await {
                break;
              }
            } else if let Some(sel) = &selection {
              if !push_view(&mut socket, &state, sel).await {
                break;
              }
            }
          }
          Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
          Message::Close(_) => break,
          _ => {}
        }
      }
    }
  }
  info!(target: "dashboard", "WebSocket disconnected");
}

async fn push_view(socket: &mut WebSocket, state: &SharedState, sel: &Selection) -> bool {
  let view = state
    .dashboard_view(sel.class_id.as_deref(), sel.assignment_id.as_deref())
    .await;
  send(socket, &ServerWsMessage::Dashboard { view }).await
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  if let Err(e) = socket.send(Message::Text(out)).await {
    error!(target: "dashboard", error = %e, "WS send error");
    return false;
  }
  true
}
