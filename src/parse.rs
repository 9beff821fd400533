//! Two-stage parsing of model evaluation output.
//!
//! Generative APIs routinely wrap the requested JSON object in prose or code
//! fences despite "JSON ONLY" instructions. Policy:
//!   1) parse the whole payload as JSON;
//!   2) failing that, parse the substring from the first `{` to the last `}`;
//!   3) failing that, or if any required field is missing, reject.
//! Missing fields are never defaulted; the caller gets either a complete
//! evaluation or an error.

use serde::Deserialize;

use crate::domain::Evaluation;

/// The three fields the evaluation prompt demands. Serde's missing-field
/// errors give us the required-presence check for free.
#[derive(Deserialize)]
struct EvaluationFields {
  correctness_percentage: f64,
  corrections: String,
  correct_code: String,
}

/// Apply the two-stage parse to a raw model payload.
/// On success the returned evaluation has `revealed = false`.
pub fn parse_evaluation(raw: &str) -> Result<Evaluation, String> {
  let fields = match serde_json::from_str::<EvaluationFields>(raw) {
    Ok(f) => f,
    Err(first_err) => {
      let candidate = extract_json_object(raw)
        .ok_or_else(|| format!("no JSON object found in payload: {first_err}"))?;
      serde_json::from_str::<EvaluationFields>(candidate)
        .map_err(|e| format!("extracted object did not parse: {e}"))?
    }
  };

  Ok(Evaluation {
    correctness_percentage: fields.correctness_percentage,
    corrections: fields.corrections,
    correct_code: fields.correct_code,
    revealed: false,
  })
}

/// Substring from the first `{` to the last `}`, inclusive.
/// Both delimiters are ASCII so byte indices are valid char boundaries.
fn extract_json_object(raw: &str) -> Option<&str> {
  let start = raw.find('{')?;
  let end = raw.rfind('}')?;
  if end < start {
    return None;
  }
  Some(&raw[start..=end])
}
