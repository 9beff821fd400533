//! Prompt construction for question generation and answer evaluation.
//!
//! Pure functions over the configured templates: deterministic, no side
//! effects. Unsupported domain/difficulty values are unrepresentable since
//! both are closed enums, so there is no runtime validation to do here.

use crate::config::Prompts;
use crate::domain::{Difficulty, Domain};
use crate::util::fill_template;

/// Ask the model for a problem statement and specification only (no solution),
/// role-appropriate for `domain`, calibrated to `difficulty`, and
/// implementation-language-agnostic.
pub fn build_question_prompt(prompts: &Prompts, domain: Domain, difficulty: Difficulty) -> String {
  fill_template(
    &prompts.question_user_template,
    &[
      ("role", domain.role_phrase()),
      ("topic", domain.topic_phrase()),
      ("difficulty", &difficulty.to_string()),
    ],
  )
}

/// Ask the model to grade `answer` against `question`, tolerating minor
/// errors, and to reply with strict JSON carrying exactly
/// `correctness_percentage`, `corrections`, and `correct_code`.
pub fn build_evaluation_prompt(
  prompts: &Prompts,
  domain: Domain,
  question: &str,
  answer: &str,
) -> String {
  fill_template(
    &prompts.evaluation_user_template,
    &[
      ("role", domain.role_phrase()),
      ("question", question),
      ("answer", answer),
    ],
  )
}
