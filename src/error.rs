//! Error taxonomy for the workflow, and its mapping onto HTTP responses.
//!
//! Every failure is surfaced to the caller; none is fatal to the process and
//! none leaves a session partially mutated.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Command rejected without any state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GuardViolation {
  #[error("no question has been generated yet")]
  NoQuestion,
  #[error("answer is blank")]
  BlankAnswer,
  #[error("a model request is already in flight for this session")]
  RequestInFlight,
  #[error("answer was already evaluated; generate a new question to continue")]
  AlreadyEvaluated,
  #[error("no evaluation to reveal")]
  NotEvaluated,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
  /// Transport/HTTP failure talking to the model. The session is returned to
  /// the phase it held before the request was initiated.
  #[error("model request failed: {0}")]
  Network(String),

  #[error("{0}")]
  Guard(#[from] GuardViolation),

  /// The parse contract was exhausted on the evaluation payload. The session
  /// reverts to awaiting-answer with question and answer preserved.
  #[error("failed to parse evaluation from model output: {0}")]
  MalformedEvaluation(String),

  #[error("unknown session: {0}")]
  UnknownSession(Uuid),
}

#[derive(Serialize)]
struct ErrorBody {
  error: &'static str,
  message: String,
}

impl WorkflowError {
  /// Stable machine-readable tag used in HTTP bodies and WS error messages.
  pub fn kind(&self) -> &'static str {
    match self {
      WorkflowError::Network(_) => "network_failure",
      WorkflowError::Guard(_) => "guard_violation",
      WorkflowError::MalformedEvaluation(_) => "malformed_evaluation",
      WorkflowError::UnknownSession(_) => "unknown_session",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      WorkflowError::Network(_) | WorkflowError::MalformedEvaluation(_) => StatusCode::BAD_GATEWAY,
      WorkflowError::Guard(GuardViolation::RequestInFlight) => StatusCode::CONFLICT,
      WorkflowError::Guard(_) => StatusCode::UNPROCESSABLE_ENTITY,
      WorkflowError::UnknownSession(_) => StatusCode::NOT_FOUND,
    }
  }
}

impl IntoResponse for WorkflowError {
  fn into_response(self) -> Response {
    let body = ErrorBody { error: self.kind(), message: self.to_string() };
    (self.status(), Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_codes_match_taxonomy() {
    assert_eq!(WorkflowError::Network("x".into()).status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
      WorkflowError::from(GuardViolation::BlankAnswer).status(),
      StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
      WorkflowError::from(GuardViolation::RequestInFlight).status(),
      StatusCode::CONFLICT
    );
    assert_eq!(
      WorkflowError::MalformedEvaluation("x".into()).status(),
      StatusCode::BAD_GATEWAY
    );
    assert_eq!(
      WorkflowError::UnknownSession(Uuid::nil()).status(),
      StatusCode::NOT_FOUND
    );
  }
}
