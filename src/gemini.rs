//! Minimal Gemini client for our use-cases.
//!
//! We only call `models/{model}:generateContent` with a single text part and
//! consume the first candidate's first part. Calls are instrumented and log
//! model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub const NO_RESPONSE_FALLBACK: &str = "No response received";

/// The one outbound operation the workflow depends on. Injected so tests can
/// script model replies without a network.
#[async_trait]
pub trait GenerateText: Send + Sync {
  /// Send a prompt, get back the raw text payload of the first candidate.
  /// An envelope with no text at any level yields `NO_RESPONSE_FALLBACK`
  /// rather than an error; only transport/HTTP failures are `Err`.
  async fn generate_content(&self, prompt: &str) -> Result<String, String>;
}

#[derive(Clone)]
pub struct GeminiClient {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl GeminiClient {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok()?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into());

    // No request timeout of our own: a call runs to completion or transport
    // failure, and the workflow blocks new requests for the session meanwhile.
    let client = reqwest::Client::builder().build().ok()?;

    Some(Self { client, api_key, base_url, model })
  }
}

#[async_trait]
impl GenerateText for GeminiClient {
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn generate_content(&self, prompt: &str) -> Result<String, String> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let req = GenerateContentRequest {
      contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
    };

    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "devprep-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header("X-goog-api-key", &self.api_key)
      .json(&req)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or(body);
      return Err(format!("Gemini HTTP {}: {}", status, msg));
    }

    let envelope: GenerateContentResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &envelope.usage_metadata {
      info!(
        prompt_tokens = ?usage.prompt_token_count,
        candidate_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }

    let text = extract_text(envelope);
    info!(elapsed = ?start.elapsed(), text_len = text.len(), "Gemini response received");
    Ok(text)
  }
}

/// First candidate's first part, or the literal fallback when the envelope
/// carries no text at any level.
fn extract_text(envelope: GenerateContentResponse) -> String {
  envelope
    .candidates
    .into_iter()
    .next()
    .and_then(|c| c.content)
    .and_then(|c| c.parts.into_iter().next())
    .and_then(|p| p.text)
    .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string())
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct GenerateContentRequest {
  contents: Vec<Content>,
}
#[derive(Serialize)]
struct Content {
  parts: Vec<Part>,
}
#[derive(Serialize)]
struct Part {
  text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(default)]
  usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate {
  #[serde(default)]
  content: Option<CandidateContent>,
}
#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}
#[derive(Deserialize)]
struct CandidatePart {
  #[serde(default)]
  text: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)]
  prompt_token_count: Option<u32>,
  #[serde(default)]
  candidates_token_count: Option<u32>,
  #[serde(default)]
  total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
