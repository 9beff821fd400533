//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Difficulty, Domain, Evaluation, Session, WorkflowPhase};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    CreateSession {
        domain: Domain,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    GetSession {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    SetDifficulty {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        difficulty: Difficulty,
    },
    GenerateQuestion {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    SetAnswer {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        text: String,
    },
    SubmitAnswer {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    RevealCode {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    RemoveSession {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionOut,
    },
    SessionRemoved {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    Error {
        kind: String,
        message: String,
    },
}

/// DTO used by both WS and HTTP for session delivery.
#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub id: Uuid,
    pub domain: Domain,
    pub difficulty: Difficulty,
    pub phase: WorkflowPhase,
    pub question: Option<String>,
    #[serde(rename = "userAnswer")]
    pub user_answer: String,
    pub evaluation: Option<EvaluationOut>,
}

#[derive(Debug, Serialize)]
pub struct EvaluationOut {
    #[serde(rename = "correctnessPercentage")]
    pub correctness_percentage: f64,
    pub corrections: String,
    #[serde(rename = "correctCode")]
    pub correct_code: String,
    pub revealed: bool,
}

/// Convert the internal `Session` to the public DTO.
pub fn to_out(s: &Session) -> SessionOut {
    SessionOut {
        id: s.id,
        domain: s.domain,
        difficulty: s.difficulty,
        phase: s.phase,
        question: s.question.clone(),
        user_answer: s.user_answer.clone(),
        evaluation: s.evaluation.as_ref().map(eval_to_out),
    }
}

fn eval_to_out(ev: &Evaluation) -> EvaluationOut {
    EvaluationOut {
        correctness_percentage: ev.correctness_percentage,
        corrections: ev.corrections.clone(),
        correct_code: ev.correct_code.clone(),
        revealed: ev.revealed,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct CreateSessionIn {
    pub domain: Domain,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyIn {
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub text: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
