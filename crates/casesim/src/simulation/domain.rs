use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for a participant's simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationId(pub String);

/// Identifier wrapper for a case-defined decision point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionPointId(pub String);

/// Input modality for a decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    MultipleChoice,
    FreeText,
}

/// One selectable answer on a multiple-choice decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub label: String,
}

/// Role-play persona a decision point may require the participant to consult.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRef {
    pub id: String,
    pub name: String,
    pub role: String,
}

/// Immutable, case-defined stage. Loaded once from the case definition and
/// never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPoint {
    pub index: usize,
    pub id: DecisionPointId,
    pub title: String,
    pub prompt: String,
    pub kind: DecisionKind,
    #[serde(default)]
    pub options: Vec<DecisionOption>,
    /// Rubric-criteria keys this stage exercises.
    #[serde(default)]
    pub rubric_keys: Vec<String>,
    #[serde(default)]
    pub persona: Option<PersonaRef>,
}

impl DecisionPoint {
    pub fn option_label(&self, option_id: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.id == option_id)
            .map(|option| option.label.as_str())
    }
}

/// One rubric entry the reasoning model scores against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub name: String,
    pub description: String,
}

/// A full case: the ordered decision points plus the scoring rubric.
/// Supplied by the external case-definition source; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDefinition {
    pub id: String,
    pub title: String,
    /// When set, the first submission of a fresh run is intercepted by the
    /// paywall preview until the participant explicitly dismisses it.
    pub paywall_gated: bool,
    pub decision_points: Vec<DecisionPoint>,
    pub rubric: Vec<RubricCriterion>,
    /// Full competency name list handed to the scoring prompt.
    pub competencies: Vec<String>,
}

impl CaseDefinition {
    pub fn total_stages(&self) -> usize {
        self.decision_points.len()
    }

    pub fn point_at(&self, stage: usize) -> Option<&DecisionPoint> {
        self.decision_points.get(stage)
    }
}

/// Who spoke in a role-play exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    Participant,
    Persona,
}

/// One message of a role-play transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: SpeakerRole,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// The persisted record of a participant's response to one decision point.
/// Appended when a stage is submitted; never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDecision {
    pub decision_point_id: DecisionPointId,
    #[serde(default)]
    pub selected_option: Option<String>,
    pub justification: String,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
}

/// Resumable run state owned by the decision workspace and persisted after
/// every stage transition.
///
/// Invariant outside an in-flight submission:
/// `decisions.len() == current_stage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub current_stage: usize,
    pub decisions: Vec<UserDecision>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Recorded so the paywall preview fires at most once per run.
    #[serde(default)]
    pub paywall_dismissed: bool,
    #[serde(default)]
    pub completed: bool,
}

impl SimulationState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_stage: 0,
            decisions: Vec::new(),
            started_at: now,
            updated_at: now,
            paywall_dismissed: false,
            completed: false,
        }
    }

    pub fn is_complete(&self, total_stages: usize) -> bool {
        self.decisions.len() >= total_stages
    }

    /// Concatenation of every justification, used by the nonsense filter.
    pub fn combined_justifications(&self) -> String {
        self.decisions
            .iter()
            .map(|decision| decision.justification.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_upholds_stage_invariant() {
        let state = SimulationState::new(Utc::now());
        assert_eq!(state.current_stage, state.decisions.len());
        assert!(!state.completed);
        assert!(!state.is_complete(1));
        assert!(state.is_complete(0));
    }

    #[test]
    fn combined_justifications_joins_in_order() {
        let mut state = SimulationState::new(Utc::now());
        for text in ["first rationale", "second rationale"] {
            state.decisions.push(UserDecision {
                decision_point_id: DecisionPointId("dp".to_string()),
                selected_option: None,
                justification: text.to_string(),
                transcript: Vec::new(),
            });
        }

        assert_eq!(
            state.combined_justifications(),
            "first rationale\n\nsecond rationale"
        );
    }
}
