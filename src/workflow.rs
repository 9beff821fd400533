//! The evaluation workflow: the five session commands and their state machine.
//!
//! Phase rules:
//!   Idle --generate--> GeneratingQuestion --ok--> AwaitingAnswer
//!   AwaitingAnswer --submit--> Evaluating --parsed--> Evaluated
//!   Evaluated --reveal--> Evaluated (revealed=true)
//!   Evaluated --generate--> GeneratingQuestion (prior answer/evaluation cleared)
//! Any transport failure returns the session to the phase it held before the
//! call; a malformed evaluation payload returns it to AwaitingAnswer with
//! question and answer preserved. At most one model request may be
//! outstanding per session: commands are rejected while the phase marks one.

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::domain::{Difficulty, Session, WorkflowPhase};
use crate::error::{GuardViolation, WorkflowError};
use crate::parse::parse_evaluation;
use crate::prompt::{build_evaluation_prompt, build_question_prompt};
use crate::state::AppState;
use crate::util::trunc_for_log;

/// Change the difficulty for subsequent generations. Allowed any time except
/// while a request is in flight.
#[instrument(level = "info", skip(state), fields(%id, %difficulty))]
pub async fn set_difficulty(
  state: &AppState,
  id: Uuid,
  difficulty: Difficulty,
) -> Result<Session, WorkflowError> {
  let mut sessions = state.sessions.write().await;
  let s = sessions.get_mut(&id).ok_or(WorkflowError::UnknownSession(id))?;
  if s.phase.request_in_flight() {
    return Err(GuardViolation::RequestInFlight.into());
  }
  s.difficulty = difficulty;
  Ok(s.clone())
}

/// Replace the draft answer text. Re-entrant; no phase change.
#[instrument(level = "debug", skip(state, text), fields(%id, text_len = text.len()))]
pub async fn set_answer(state: &AppState, id: Uuid, text: String) -> Result<Session, WorkflowError> {
  let mut sessions = state.sessions.write().await;
  let s = sessions.get_mut(&id).ok_or(WorkflowError::UnknownSession(id))?;
  if s.phase.request_in_flight() {
    return Err(GuardViolation::RequestInFlight.into());
  }
  s.user_answer = text;
  Ok(s.clone())
}

/// Request a fresh question from the model. Clears any prior answer and
/// evaluation once the response is applied; never blocks on an empty
/// envelope (the client substitutes a placeholder instead).
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn generate_question(state: &AppState, id: Uuid) -> Result<Session, WorkflowError> {
  let client = state.generator()?;

  // Flip the phase under the write lock so a concurrent command observes the
  // in-flight marker and is rejected.
  let (domain, difficulty, prior_phase) = {
    let mut sessions = state.sessions.write().await;
    let s = sessions.get_mut(&id).ok_or(WorkflowError::UnknownSession(id))?;
    if s.phase.request_in_flight() {
      return Err(GuardViolation::RequestInFlight.into());
    }
    let prior = s.phase;
    s.phase = WorkflowPhase::GeneratingQuestion;
    (s.domain, s.difficulty, prior)
  };

  let prompt = build_question_prompt(&state.prompts, domain, difficulty);
  match client.generate_content(&prompt).await {
    Ok(text) => {
      let mut sessions = state.sessions.write().await;
      let s = sessions.get_mut(&id).ok_or(WorkflowError::UnknownSession(id))?;
      s.question = Some(text);
      s.user_answer.clear();
      s.evaluation = None;
      s.phase = WorkflowPhase::AwaitingAnswer;
      info!(target: "session", %id, ?domain, %difficulty, question_preview = %trunc_for_log(s.question.as_deref().unwrap_or(""), 80), "Question generated");
      Ok(s.clone())
    }
    Err(e) => {
      let mut sessions = state.sessions.write().await;
      if let Some(s) = sessions.get_mut(&id) {
        s.phase = prior_phase;
      }
      error!(target: "session", %id, error = %e, "Question generation failed; phase restored");
      Err(WorkflowError::Network(e))
    }
  }
}

/// Submit the current answer for grading. Guarded: a question must exist, the
/// trimmed answer must be non-blank, and the session must be awaiting one.
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn submit_answer(state: &AppState, id: Uuid) -> Result<Session, WorkflowError> {
  let client = state.generator()?;

  let (domain, question, answer) = {
    let mut sessions = state.sessions.write().await;
    let s = sessions.get_mut(&id).ok_or(WorkflowError::UnknownSession(id))?;
    if s.phase.request_in_flight() {
      return Err(GuardViolation::RequestInFlight.into());
    }
    let question = match &s.question {
      Some(q) if !q.is_empty() => q.clone(),
      _ => return Err(GuardViolation::NoQuestion.into()),
    };
    if s.user_answer.trim().is_empty() {
      return Err(GuardViolation::BlankAnswer.into());
    }
    if s.phase != WorkflowPhase::AwaitingAnswer {
      return Err(GuardViolation::AlreadyEvaluated.into());
    }
    s.phase = WorkflowPhase::Evaluating;
    (s.domain, question, s.user_answer.clone())
  };

  let prompt = build_evaluation_prompt(&state.prompts, domain, &question, &answer);
  let raw = match client.generate_content(&prompt).await {
    Ok(raw) => raw,
    Err(e) => {
      let mut sessions = state.sessions.write().await;
      if let Some(s) = sessions.get_mut(&id) {
        s.phase = WorkflowPhase::AwaitingAnswer;
      }
      error!(target: "session", %id, error = %e, "Evaluation request failed; back to awaiting answer");
      return Err(WorkflowError::Network(e));
    }
  };

  match parse_evaluation(&raw) {
    Ok(ev) => {
      let mut sessions = state.sessions.write().await;
      let s = sessions.get_mut(&id).ok_or(WorkflowError::UnknownSession(id))?;
      info!(target: "session", %id, correctness = ev.correctness_percentage, "Answer evaluated");
      s.evaluation = Some(ev);
      s.phase = WorkflowPhase::Evaluated;
      Ok(s.clone())
    }
    Err(e) => {
      // Question and answer stay put so the user can retry the submission.
      let mut sessions = state.sessions.write().await;
      if let Some(s) = sessions.get_mut(&id) {
        s.phase = WorkflowPhase::AwaitingAnswer;
      }
      error!(target: "session", %id, error = %e, payload_preview = %trunc_for_log(&raw, 120), "Evaluation payload unparseable");
      Err(WorkflowError::MalformedEvaluation(e))
    }
  }
}

/// Show the corrected code of the stored evaluation.
#[instrument(level = "info", skip(state), fields(%id))]
pub async fn reveal_code(state: &AppState, id: Uuid) -> Result<Session, WorkflowError> {
  let mut sessions = state.sessions.write().await;
  let s = sessions.get_mut(&id).ok_or(WorkflowError::UnknownSession(id))?;
  match (s.phase, s.evaluation.as_mut()) {
    (WorkflowPhase::Evaluated, Some(ev)) => {
      ev.revealed = true;
      Ok(s.clone())
    }
    _ => Err(GuardViolation::NotEvaluated.into()),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::VecDeque;
  use std::sync::{Arc, Mutex};

  use async_trait::async_trait;

  use super::*;
  use crate::config::Prompts;
  use crate::domain::Domain;
  use crate::gemini::GenerateText;

  /// Scripted stand-in for the Gemini client: pops one reply per call.
  struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
  }

  impl ScriptedModel {
    fn new<I>(replies: I) -> Arc<Self>
    where
      I: IntoIterator<Item = Result<String, String>>,
    {
      Arc::new(Self { replies: Mutex::new(replies.into_iter().collect()) })
    }
  }

  #[async_trait]
  impl GenerateText for ScriptedModel {
    async fn generate_content(&self, _prompt: &str) -> Result<String, String> {
      self
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err("script exhausted".into()))
    }
  }

  fn state_with(replies: Vec<Result<String, String>>) -> AppState {
    AppState::with_generator(Some(ScriptedModel::new(replies)), Prompts::default())
  }

  const GOOD_EVAL: &str =
    r#"{"correctness_percentage":50,"corrections":"missing null check","correct_code":"fixed();"}"#;

  #[tokio::test]
  async fn submit_without_question_is_rejected_without_state_change() {
    let state = state_with(vec![]);
    let s = state.create_session(Domain::Frontend, Difficulty::Easy).await;

    let err = submit_answer(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Guard(GuardViolation::NoQuestion)));
    assert_eq!(state.get_session(s.id).await.unwrap().phase, WorkflowPhase::Idle);
  }

  #[tokio::test]
  async fn submit_with_blank_answer_is_rejected() {
    let state = state_with(vec![Ok("Q1".into())]);
    let s = state.create_session(Domain::Backend, Difficulty::Medium).await;
    generate_question(&state, s.id).await.unwrap();
    set_answer(&state, s.id, "   ".into()).await.unwrap();

    let err = submit_answer(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Guard(GuardViolation::BlankAnswer)));
    assert_eq!(
      state.get_session(s.id).await.unwrap().phase,
      WorkflowPhase::AwaitingAnswer
    );
  }

  #[tokio::test]
  async fn full_cycle_generate_submit_reveal() {
    let state = state_with(vec![Ok("Q1".into()), Ok(GOOD_EVAL.into())]);
    let s = state.create_session(Domain::Testing, Difficulty::Hard).await;

    let s1 = generate_question(&state, s.id).await.unwrap();
    assert_eq!(s1.phase, WorkflowPhase::AwaitingAnswer);
    assert_eq!(s1.question.as_deref(), Some("Q1"));

    set_answer(&state, s.id, "my answer".into()).await.unwrap();
    let s2 = submit_answer(&state, s.id).await.unwrap();
    assert_eq!(s2.phase, WorkflowPhase::Evaluated);
    let ev = s2.evaluation.expect("evaluation present");
    assert_eq!(ev.correctness_percentage, 50.0);
    assert_eq!(ev.corrections, "missing null check");
    assert!(!ev.revealed);

    let s3 = reveal_code(&state, s.id).await.unwrap();
    assert!(s3.evaluation.unwrap().revealed);
  }

  #[tokio::test]
  async fn regeneration_clears_answer_and_evaluation() {
    let state = state_with(vec![Ok("Q1".into()), Ok(GOOD_EVAL.into()), Ok("Q2".into())]);
    let s = state.create_session(Domain::MachineLearning, Difficulty::Easy).await;

    generate_question(&state, s.id).await.unwrap();
    set_answer(&state, s.id, "attempt".into()).await.unwrap();
    submit_answer(&state, s.id).await.unwrap();

    let fresh = generate_question(&state, s.id).await.unwrap();
    assert_eq!(fresh.phase, WorkflowPhase::AwaitingAnswer);
    assert_eq!(fresh.question.as_deref(), Some("Q2"));
    assert!(fresh.user_answer.is_empty());
    assert!(fresh.evaluation.is_none());
  }

  #[tokio::test]
  async fn generation_failure_restores_prior_phase() {
    let state = state_with(vec![Err("connection refused".into())]);
    let s = state.create_session(Domain::Frontend, Difficulty::Easy).await;

    let err = generate_question(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Network(_)));
    let after = state.get_session(s.id).await.unwrap();
    assert_eq!(after.phase, WorkflowPhase::Idle);
    assert!(after.question.is_none());
  }

  #[tokio::test]
  async fn evaluation_network_failure_preserves_question_and_answer() {
    let state = state_with(vec![Ok("Q1".into()), Err("timeout".into())]);
    let s = state.create_session(Domain::Backend, Difficulty::Hard).await;
    generate_question(&state, s.id).await.unwrap();
    set_answer(&state, s.id, "attempt".into()).await.unwrap();

    let err = submit_answer(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Network(_)));
    let after = state.get_session(s.id).await.unwrap();
    assert_eq!(after.phase, WorkflowPhase::AwaitingAnswer);
    assert_eq!(after.question.as_deref(), Some("Q1"));
    assert_eq!(after.user_answer, "attempt");
    assert!(after.evaluation.is_none());
  }

  #[tokio::test]
  async fn malformed_evaluation_reverts_to_awaiting_answer() {
    let state = state_with(vec![Ok("Q1".into()), Ok("I cannot grade this.".into())]);
    let s = state.create_session(Domain::Testing, Difficulty::Medium).await;
    generate_question(&state, s.id).await.unwrap();
    set_answer(&state, s.id, "attempt".into()).await.unwrap();

    let err = submit_answer(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::MalformedEvaluation(_)));
    let after = state.get_session(s.id).await.unwrap();
    assert_eq!(after.phase, WorkflowPhase::AwaitingAnswer);
    assert_eq!(after.question.as_deref(), Some("Q1"));
    assert_eq!(after.user_answer, "attempt");
    assert!(after.evaluation.is_none());
  }

  #[tokio::test]
  async fn partial_evaluation_json_is_never_stored() {
    let state = state_with(vec![Ok("Q1".into()), Ok(r#"{"correctness_percentage":80}"#.into())]);
    let s = state.create_session(Domain::Frontend, Difficulty::Easy).await;
    generate_question(&state, s.id).await.unwrap();
    set_answer(&state, s.id, "attempt".into()).await.unwrap();

    let err = submit_answer(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::MalformedEvaluation(_)));
    assert!(state.get_session(s.id).await.unwrap().evaluation.is_none());
  }

  #[tokio::test]
  async fn commands_are_rejected_while_a_request_is_in_flight() {
    // Drive the session into Evaluating by hand; the scripted model would
    // otherwise complete before we could observe the in-flight phase.
    let state = state_with(vec![]);
    let s = state.create_session(Domain::Backend, Difficulty::Easy).await;
    {
      let mut sessions = state.sessions.write().await;
      let sess = sessions.get_mut(&s.id).unwrap();
      sess.question = Some("Q1".into());
      sess.user_answer = "attempt".into();
      sess.phase = WorkflowPhase::Evaluating;
    }

    for err in [
      generate_question(&state, s.id).await.unwrap_err(),
      submit_answer(&state, s.id).await.unwrap_err(),
      set_answer(&state, s.id, "other".into()).await.unwrap_err(),
      set_difficulty(&state, s.id, Difficulty::Hard).await.unwrap_err(),
    ] {
      assert!(matches!(err, WorkflowError::Guard(GuardViolation::RequestInFlight)));
    }
    let after = state.get_session(s.id).await.unwrap();
    assert_eq!(after.phase, WorkflowPhase::Evaluating);
    assert_eq!(after.user_answer, "attempt");
  }

  #[tokio::test]
  async fn submit_after_evaluated_requires_regeneration() {
    let state = state_with(vec![Ok("Q1".into()), Ok(GOOD_EVAL.into())]);
    let s = state.create_session(Domain::Frontend, Difficulty::Easy).await;
    generate_question(&state, s.id).await.unwrap();
    set_answer(&state, s.id, "attempt".into()).await.unwrap();
    submit_answer(&state, s.id).await.unwrap();

    let err = submit_answer(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Guard(GuardViolation::AlreadyEvaluated)));
    assert_eq!(state.get_session(s.id).await.unwrap().phase, WorkflowPhase::Evaluated);
  }

  #[tokio::test]
  async fn reveal_outside_evaluated_is_rejected() {
    let state = state_with(vec![]);
    let s = state.create_session(Domain::Testing, Difficulty::Easy).await;
    let err = reveal_code(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Guard(GuardViolation::NotEvaluated)));
  }

  #[tokio::test]
  async fn difficulty_can_change_before_and_after_generation() {
    let state = state_with(vec![Ok("Q1".into())]);
    let s = state.create_session(Domain::Backend, Difficulty::Easy).await;
    set_difficulty(&state, s.id, Difficulty::Hard).await.unwrap();
    let s1 = generate_question(&state, s.id).await.unwrap();
    assert_eq!(s1.difficulty, Difficulty::Hard);
    let s2 = set_difficulty(&state, s.id, Difficulty::Medium).await.unwrap();
    assert_eq!(s2.difficulty, Difficulty::Medium);
    // The existing question is untouched by a difficulty change.
    assert_eq!(s2.question.as_deref(), Some("Q1"));
  }

  #[tokio::test]
  async fn missing_generator_is_a_network_failure() {
    let state = AppState::with_generator(None, Prompts::default());
    let s = state.create_session(Domain::Frontend, Difficulty::Easy).await;
    let err = generate_question(&state, s.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Network(_)));
    assert_eq!(state.get_session(s.id).await.unwrap().phase, WorkflowPhase::Idle);
  }

  #[tokio::test]
  async fn unknown_session_is_reported() {
    let state = state_with(vec![]);
    let missing = Uuid::new_v4();
    let err = set_answer(&state, missing, "x".into()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::UnknownSession(_)));
  }
}
