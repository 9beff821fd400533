//! Domain models: practice domains, difficulty, workflow phase, evaluation, session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which practice category a session belongs to.
/// Each screen in the client instantiates exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
  Frontend,
  Backend,
  Testing,
  MachineLearning,
}

impl Domain {
  /// Role the model should assume the user holds ("fresher in an MNC" framing).
  pub fn role_phrase(&self) -> &'static str {
    match self {
      Domain::Frontend => "frontend developer",
      Domain::Backend => "backend developer",
      Domain::Testing => "software tester",
      Domain::MachineLearning => "machine learning engineer",
    }
  }

  /// Subject area the generated question should cover.
  pub fn topic_phrase(&self) -> &'static str {
    match self {
      Domain::Frontend => "frontend design",
      Domain::Backend => "backend development",
      Domain::Testing => "software testing",
      Domain::MachineLearning => "machine learning",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Default for Difficulty {
  fn default() -> Self { Difficulty::Easy }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    };
    f.write_str(s)
  }
}

/// Where a session currently sits in the generate/answer/evaluate cycle.
/// GeneratingQuestion and Evaluating mark an outstanding model request;
/// no new request may be issued while in either.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
  Idle,
  GeneratingQuestion,
  AwaitingAnswer,
  Evaluating,
  Evaluated,
}

impl WorkflowPhase {
  pub fn request_in_flight(&self) -> bool {
    matches!(self, WorkflowPhase::GeneratingQuestion | WorkflowPhase::Evaluating)
  }
}

/// Structured grading result for a submitted answer.
/// Produced whole by the parse contract; never partially populated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Evaluation {
  pub correctness_percentage: f64,
  pub corrections: String,
  pub correct_code: String,
  /// Whether the user has asked to see the corrected code. Starts false.
  #[serde(default)]
  pub revealed: bool,
}

/// One user's in-progress question/answer/evaluation cycle for one domain.
/// Owned by its screen instance: created on mount, discarded on navigation away.
#[derive(Clone, Debug, Serialize)]
pub struct Session {
  pub id: Uuid,
  pub domain: Domain,
  pub difficulty: Difficulty,
  pub question: Option<String>,
  pub user_answer: String,
  pub evaluation: Option<Evaluation>,
  pub phase: WorkflowPhase,
}

impl Session {
  pub fn new(domain: Domain, difficulty: Difficulty) -> Self {
    Self {
      id: Uuid::new_v4(),
      domain,
      difficulty,
      question: None,
      user_answer: String::new(),
      evaluation: None,
      phase: WorkflowPhase::Idle,
    }
  }
}
