use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    CaseDefinition, DecisionKind, DecisionPointId, SimulationId, SimulationState, TranscriptEntry,
    UserDecision,
};
use super::store::{SimulationStore, StoreError};
use super::validation::{validate_justification, JustificationIssue};

/// Drives stage progression for one case: guards submissions, interposes the
/// paywall preview, and persists the full state after every transition.
///
/// Single-writer by construction: one participant, one active stage. There
/// is no back transition; prior decisions are immutable once persisted.
pub struct DecisionWorkspace<S> {
    case: Arc<CaseDefinition>,
    store: Arc<S>,
}

/// Everything a stage submission carries.
#[derive(Debug, Clone)]
pub struct DecisionSubmission {
    pub decision_point_id: DecisionPointId,
    pub selected_option: Option<String>,
    pub justification: String,
    pub transcript: Vec<TranscriptEntry>,
    /// Whether the role-play chat was opened for this stage. Proceeding is
    /// permitted once the chat has been initiated, not necessarily finished.
    pub persona_opened: bool,
}

/// Outcome of a submit attempt. Guard failures are structured variants, not
/// errors; only store/load faults raise.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// A transition guard failed; displayed inline and recoverable.
    Rejected { reason: SubmissionRejection },
    /// The paywall preview intercepted the submission.
    PaywallBlocked { preview: PaywallPreview },
    /// Stage accepted; more stages remain.
    Advanced {
        state: SimulationState,
        save: SaveStatus,
    },
    /// Final stage accepted; the run is ready for debrief generation.
    Completed {
        state: SimulationState,
        save: SaveStatus,
    },
}

/// Transition-guard failure classes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionRejection {
    #[error("select one of the available options before submitting")]
    MissingOption,
    #[error(transparent)]
    Justification(#[from] JustificationIssue),
    #[error("open the conversation with {persona} before submitting this decision")]
    PersonaRequired { persona: String },
}

/// Locked preview shown when the paywall gate fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaywallPreview {
    pub case_title: String,
    pub stage_title: String,
    pub message: String,
    pub call_to_action: String,
}

/// Persistence outcome surfaced to the participant; "save failed" is
/// distinguishable from "saved" rather than silently dropping state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    Saved,
    Saving,
    Failed { detail: String },
}

/// Hard faults only; guard failures travel inside [`SubmitOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("submission targets {submitted:?} but the current stage is {expected:?}")]
    StageMismatch {
        expected: DecisionPointId,
        submitted: DecisionPointId,
    },
    #[error("simulation already completed all {total} stages")]
    AlreadyComplete { total: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<S: SimulationStore> DecisionWorkspace<S> {
    pub fn new(case: Arc<CaseDefinition>, store: Arc<S>) -> Self {
        Self { case, store }
    }

    pub fn case(&self) -> &CaseDefinition {
        &self.case
    }

    /// Load existing state, or initialize a fresh run.
    pub fn load_or_start(&self, id: &SimulationId) -> Result<SimulationState, WorkspaceError> {
        if let Some(state) = self.store.load_state(id)? {
            return Ok(state);
        }

        let state = SimulationState::new(Utc::now());
        self.store.persist_state(id, &state)?;
        Ok(state)
    }

    pub fn get_state(&self, id: &SimulationId) -> Result<Option<SimulationState>, WorkspaceError> {
        Ok(self.store.load_state(id)?)
    }

    /// Submit the current stage. On success the decision is appended, the
    /// stage index advances, and the full state is persisted. A persist
    /// failure is non-fatal: the advanced state is still returned so the
    /// caller retains in-memory progress and may retry.
    pub fn submit_decision(
        &self,
        id: &SimulationId,
        submission: DecisionSubmission,
    ) -> Result<SubmitOutcome, WorkspaceError> {
        let mut state = self.load_or_start(id)?;
        let total = self.case.total_stages();

        let Some(point) = self.case.point_at(state.current_stage) else {
            return Err(WorkspaceError::AlreadyComplete { total });
        };

        if point.id != submission.decision_point_id {
            return Err(WorkspaceError::StageMismatch {
                expected: point.id.clone(),
                submitted: submission.decision_point_id,
            });
        }

        if point.kind == DecisionKind::MultipleChoice && submission.selected_option.is_none() {
            return Ok(SubmitOutcome::Rejected {
                reason: SubmissionRejection::MissingOption,
            });
        }

        if let Err(issue) = validate_justification(&submission.justification) {
            return Ok(SubmitOutcome::Rejected {
                reason: SubmissionRejection::Justification(issue),
            });
        }

        if let Some(persona) = &point.persona {
            if !submission.persona_opened && submission.transcript.is_empty() {
                return Ok(SubmitOutcome::Rejected {
                    reason: SubmissionRejection::PersonaRequired {
                        persona: persona.name.clone(),
                    },
                });
            }
        }

        // Fires at most once per run: first stage, nothing decided yet, and
        // the participant has not dismissed the preview.
        if self.case.paywall_gated
            && state.current_stage == 0
            && state.decisions.is_empty()
            && !state.paywall_dismissed
        {
            info!(simulation = %id.0, case = %self.case.id, "paywall preview intercepted submission");
            return Ok(SubmitOutcome::PaywallBlocked {
                preview: self.paywall_preview(&point.title),
            });
        }

        state.decisions.push(UserDecision {
            decision_point_id: submission.decision_point_id,
            selected_option: submission.selected_option,
            justification: submission.justification,
            transcript: submission.transcript,
        });
        state.current_stage += 1;
        state.updated_at = Utc::now();
        if state.current_stage == total {
            state.completed = true;
        }

        let save = self.persist_with_status(id, &state);
        info!(
            simulation = %id.0,
            stage = state.current_stage,
            total,
            completed = state.completed,
            "stage submitted"
        );

        if state.completed {
            Ok(SubmitOutcome::Completed { state, save })
        } else {
            Ok(SubmitOutcome::Advanced { state, save })
        }
    }

    /// Record an explicit paywall dismissal so the gate never re-triggers
    /// for the remainder of the run.
    pub fn dismiss_paywall(&self, id: &SimulationId) -> Result<SimulationState, WorkspaceError> {
        let mut state = self.load_or_start(id)?;
        if !state.paywall_dismissed {
            state.paywall_dismissed = true;
            state.updated_at = Utc::now();
            self.store.persist_state(id, &state)?;
            info!(simulation = %id.0, "paywall dismissed");
        }
        Ok(state)
    }

    fn persist_with_status(&self, id: &SimulationId, state: &SimulationState) -> SaveStatus {
        match self.store.persist_state(id, state) {
            Ok(()) => SaveStatus::Saved,
            Err(err) => {
                warn!(simulation = %id.0, error = %err, "state persist failed; progress retained in memory");
                SaveStatus::Failed {
                    detail: err.to_string(),
                }
            }
        }
    }

    fn paywall_preview(&self, stage_title: &str) -> PaywallPreview {
        PaywallPreview {
            case_title: self.case.title.clone(),
            stage_title: stage_title.to_string(),
            message: format!(
                "The full {} simulation, including your scored debrief, is part of the premium track.",
                self.case.title
            ),
            call_to_action: "Unlock the full case library".to_string(),
        }
    }
}
