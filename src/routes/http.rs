//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! workflow; guard/network/parse failures become status codes via
//! `IntoResponse` on `WorkflowError`.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::protocol::*;
use crate::state::AppState;
use crate::workflow;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state), fields(domain = ?body.domain))]
pub async fn http_create_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateSessionIn>,
) -> impl IntoResponse {
  let s = state
    .create_session(body.domain, body.difficulty.unwrap_or_default())
    .await;
  info!(target: "session", id = %s.id, "HTTP session created");
  Json(to_out(&s))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionOut>, WorkflowError> {
  let s = state.get_session(id).await?;
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_remove_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<HealthOut>, WorkflowError> {
  state.remove_session(id).await?;
  Ok(Json(HealthOut { ok: true }))
}

#[instrument(level = "info", skip(state), fields(%id, difficulty = %body.difficulty))]
pub async fn http_set_difficulty(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DifficultyIn>,
) -> Result<Json<SessionOut>, WorkflowError> {
  let s = workflow::set_difficulty(&state, id, body.difficulty).await?;
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_generate_question(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionOut>, WorkflowError> {
  let s = workflow::generate_question(&state, id).await?;
  info!(target: "session", %id, "HTTP question served");
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state, body), fields(%id, text_len = body.text.len()))]
pub async fn http_set_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<SessionOut>, WorkflowError> {
  let s = workflow::set_answer(&state, id, body.text).await?;
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_submit_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionOut>, WorkflowError> {
  let s = workflow::submit_answer(&state, id).await?;
  info!(target: "session", %id, "HTTP answer evaluated");
  Ok(Json(to_out(&s)))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_reveal_code(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SessionOut>, WorkflowError> {
  let s = workflow::reveal_code(&state, id).await?;
  Ok(Json(to_out(&s)))
}
