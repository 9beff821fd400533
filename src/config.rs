//! Loading application configuration (prompt templates) from TOML.
//!
//! See `AppConfig` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompt templates used when talking to the model. Defaults reproduce the
/// production prompts; override them in TOML to tune tone/structure.
///
/// Placeholders: `{role}`, `{topic}`, `{difficulty}` in the question template;
/// `{role}`, `{question}`, `{answer}` in the evaluation template.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub question_user_template: String,
  pub evaluation_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_user_template: "Assume I am a fresher who has just joined an IT company in a {role} role. \
I want to get familiar with the typical tasks and coding questions I am likely to face in this role at a \
multinational company (MNC). Please provide a sample coding question related to {topic} that a {role} \
would commonly be assigned in an MNC, along with clear and detailed specifications that follow industry \
practices. The difficulty level should be {difficulty}. Return only the question and specifications, \
without any explanations or answers. The question should be suitable for implementation in any \
programming language or framework, based on the user's preference."
        .into(),
      evaluation_user_template: "You are a code reviewing assistant for the {role} role. Evaluate the \
following answer to the given question. Only check for major logic or syntax errors and neglect very \
minute errors. Return the correctness percentage as a number, a list of corrections as descriptive words \
(not code), and the fully correct code separately.\n\nQuestion:\n{question}\n\nUser's answer:\n{answer}\n\n\
Respond in the following JSON format ONLY:\n{\n  \"correctness_percentage\": <number>,\n  \"corrections\": \
\"<descriptive text corrections>\",\n  \"correct_code\": \"<fully corrected code>\"\n}"
        .into(),
    }
  }
}

/// Attempt to load `AppConfig` from DEVPREP_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("DEVPREP_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "devprep_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "devprep_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "devprep_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
