use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::radar::RadarProjection;
use crate::simulation::domain::SimulationId;

/// Scores live on a fixed 1–5 scale.
pub const SCORE_MIN: f32 = 1.0;
pub const SCORE_MID: f32 = 3.0;
pub const SCORE_MAX: f32 = 5.0;

/// One competency's scored feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub name: String,
    pub score: f32,
    pub justification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weakness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

/// The terminal artifact of a completed simulation. Created once; a
/// regeneration overwrites rather than versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebriefResult {
    pub simulation_id: SimulationId,
    pub scores: Vec<CompetencyScore>,
    pub radar: RadarProjection,
    pub summary: String,
    pub key_insight: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exemplar: Option<String>,
    /// Reasoning-model identifier recorded for logging; absent for
    /// synthesized fallback results that never reached the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Identifier returned when a scoring job is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Scoring request handed to the job-queue collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub simulation_id: SimulationId,
}

/// Lifecycle states reported by the job-queue collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Status snapshot for a submitted scoring job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DebriefResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn pending() -> Self {
        Self {
            state: JobState::Pending,
            result: None,
            error: None,
        }
    }

    pub fn processing() -> Self {
        Self {
            state: JobState::Processing,
            result: None,
            error: None,
        }
    }

    pub fn completed(result: DebriefResult) -> Self {
        Self {
            state: JobState::Completed,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: JobState::Failed,
            result: None,
            error: Some(error.into()),
        }
    }
}
