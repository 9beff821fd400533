//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the workflow. We reply with a single JSON message per request.

use std::sync::Arc;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::error::WorkflowError;
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::workflow;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "devprep_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "devprep_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target = "devprep_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error {
            kind: "invalid_message".into(),
            message: format!("Invalid JSON: {}", e),
          },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "kind": "internal", "message": format!("Serialization error: {}", e) })
            .to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "devprep_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => {
        let _ = socket.send(Message::Pong(payload)).await;
      }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "devprep_backend", "WebSocket disconnected");
}

fn ws_error(e: WorkflowError) -> ServerWsMessage {
  ServerWsMessage::Error { kind: e.kind().into(), message: e.to_string() }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::CreateSession { domain, difficulty } => {
      let s = state.create_session(domain, difficulty.unwrap_or_default()).await;
      tracing::info!(target: "session", id = %s.id, ?domain, "WS session created");
      ServerWsMessage::Session { session: to_out(&s) }
    }

    ClientWsMessage::GetSession { session_id } => match state.get_session(session_id).await {
      Ok(s) => ServerWsMessage::Session { session: to_out(&s) },
      Err(e) => ws_error(e),
    },

    ClientWsMessage::SetDifficulty { session_id, difficulty } => {
      match workflow::set_difficulty(state, session_id, difficulty).await {
        Ok(s) => ServerWsMessage::Session { session: to_out(&s) },
        Err(e) => ws_error(e),
      }
    }

    ClientWsMessage::GenerateQuestion { session_id } => {
      match workflow::generate_question(state, session_id).await {
        Ok(s) => {
          tracing::info!(target: "session", id = %session_id, "WS question served");
          ServerWsMessage::Session { session: to_out(&s) }
        }
        Err(e) => ws_error(e),
      }
    }

    ClientWsMessage::SetAnswer { session_id, text } => {
      match workflow::set_answer(state, session_id, text).await {
        Ok(s) => ServerWsMessage::Session { session: to_out(&s) },
        Err(e) => ws_error(e),
      }
    }

    ClientWsMessage::SubmitAnswer { session_id } => {
      match workflow::submit_answer(state, session_id).await {
        Ok(s) => {
          tracing::info!(target: "session", id = %session_id, "WS answer evaluated");
          ServerWsMessage::Session { session: to_out(&s) }
        }
        Err(e) => ws_error(e),
      }
    }

    ClientWsMessage::RevealCode { session_id } => {
      match workflow::reveal_code(state, session_id).await {
        Ok(s) => ServerWsMessage::Session { session: to_out(&s) },
        Err(e) => ws_error(e),
      }
    }

    ClientWsMessage::RemoveSession { session_id } => {
      match state.remove_session(session_id).await {
        Ok(()) => ServerWsMessage::SessionRemoved { session_id },
        Err(e) => ws_error(e),
      }
    }
  }
}
