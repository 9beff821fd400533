//! Application state: the in-memory session store, prompts, and the Gemini client.
//!
//! Sessions are independent of one another; all cross-request coordination is
//! the single `RwLock` around the store. The per-session "at most one
//! outstanding model request" rule lives in `workflow`, expressed through the
//! phase field while this lock is held.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::{load_app_config_from_env, Prompts};
use crate::domain::{Difficulty, Domain, Session};
use crate::error::WorkflowError;
use crate::gemini::{GeminiClient, GenerateText};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    pub gemini: Option<Arc<dyn GenerateText>>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, init the Gemini client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let prompts = load_app_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let gemini: Option<Arc<dyn GenerateText>> = match GeminiClient::from_env() {
            Some(client) => {
                info!(target: "devprep_backend", base_url = %client.base_url, model = %client.model, "Gemini enabled.");
                Some(Arc::new(client))
            }
            None => {
                info!(target: "devprep_backend", "Gemini disabled (no GEMINI_API_KEY). Generation and evaluation will fail.");
                None
            }
        };

        Self::with_generator(gemini, prompts)
    }

    pub fn with_generator(gemini: Option<Arc<dyn GenerateText>>, prompts: Prompts) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            gemini,
            prompts,
        }
    }

    /// The model client, or a network failure when it was never configured.
    pub fn generator(&self) -> Result<&dyn GenerateText, WorkflowError> {
        self.gemini
            .as_deref()
            .ok_or_else(|| WorkflowError::Network("Gemini is not configured (GEMINI_API_KEY missing)".into()))
    }

    /// Create a session for one screen instance.
    #[instrument(level = "info", skip(self))]
    pub async fn create_session(&self, domain: Domain, difficulty: Difficulty) -> Session {
        let s = Session::new(domain, difficulty);
        let id = s.id;
        self.sessions.write().await.insert(id, s.clone());
        info!(target: "session", %id, ?domain, %difficulty, "Session created");
        s
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Session, WorkflowError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::UnknownSession(id))
    }

    /// Discard a session (screen navigated away). A request still in flight
    /// for it simply finds nothing to apply its result to.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub async fn remove_session(&self, id: Uuid) -> Result<(), WorkflowError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!(target: "session", %id, "Session removed");
                Ok(())
            }
            None => Err(WorkflowError::UnknownSession(id)),
        }
    }
}
