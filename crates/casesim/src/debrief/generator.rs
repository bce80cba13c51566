//! Debrief generation: the scoring request a finished simulation turns into.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::clients::{ModelError, ReasoningModel};
use super::domain::{CompetencyScore, DebriefResult, SCORE_MIN};
use super::parser::parse_model_output;
use super::prompt::{ScoringContext, EXEMPLAR_SYSTEM, SCORING_SYSTEM};
use super::radar::{project, RadarProjection};
use crate::simulation::domain::{CaseDefinition, SimulationId, SimulationState};
use crate::simulation::store::{SimulationStore, StoreError};
use crate::simulation::validation::validate_justification;

/// Turns a completed simulation into a scored [`DebriefResult`].
///
/// The nonsense filter runs before anything else so garbage input never
/// reaches the paid model, and an already-stored debrief short-circuits
/// generation entirely (at-least-once submission, idempotent user-visible
/// effect).
pub struct DebriefGenerator<S, M> {
    store: Arc<S>,
    model: Arc<M>,
}

#[derive(Debug, thiserror::Error)]
pub enum DebriefError {
    #[error("no simulation state stored for this id")]
    UnknownSimulation,
    #[error("simulation has completed {completed} of {total} stages")]
    SimulationIncomplete { completed: usize, total: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl<S: SimulationStore, M: ReasoningModel> DebriefGenerator<S, M> {
    pub fn new(store: Arc<S>, model: Arc<M>) -> Self {
        Self { store, model }
    }

    pub async fn generate(
        &self,
        case: &CaseDefinition,
        simulation_id: &SimulationId,
    ) -> Result<DebriefResult, DebriefError> {
        if let Some(existing) = self.store.load_debrief(simulation_id)? {
            info!(simulation = %simulation_id.0, "debrief already generated; returning stored result");
            return Ok(existing);
        }

        let state = self
            .store
            .load_state(simulation_id)?
            .ok_or(DebriefError::UnknownSimulation)?;

        let total = case.total_stages();
        if !state.is_complete(total) {
            return Err(DebriefError::SimulationIncomplete {
                completed: state.decisions.len(),
                total,
            });
        }

        let combined = state.combined_justifications();
        if let Err(issue) = validate_justification(&combined) {
            info!(
                simulation = %simulation_id.0,
                issue = %issue,
                "nonsense filter tripped; skipping model call"
            );
            let debrief = minimum_effort_debrief(case, simulation_id);
            self.store.persist_debrief(simulation_id, &debrief)?;
            return Ok(debrief);
        }

        let context = ScoringContext::from_simulation(case, &state);
        let reply = self
            .model
            .complete(SCORING_SYSTEM, &context.render_scoring_prompt())
            .await?;

        let parsed = parse_model_output(&reply.text, &case.competencies);
        info!(
            simulation = %simulation_id.0,
            model = %reply.model_id,
            tier = ?parsed.tier,
            competencies = parsed.scores.len(),
            "model output parsed"
        );
        let radar = project(&parsed.scores);

        // Best-effort exemplar: its failure never blocks the primary result.
        let exemplar = match self
            .model
            .complete(EXEMPLAR_SYSTEM, &context.render_exemplar_prompt())
            .await
        {
            Ok(reply) => Some(reply.text),
            Err(err) => {
                warn!(simulation = %simulation_id.0, error = %err, "exemplar call failed; continuing without one");
                None
            }
        };

        let debrief = DebriefResult {
            simulation_id: simulation_id.clone(),
            scores: parsed.scores,
            radar,
            summary: parsed.summary,
            key_insight: parsed.key_insight,
            exemplar,
            model_id: Some(reply.model_id),
            generated_at: Utc::now(),
        };

        self.store.persist_debrief(simulation_id, &debrief)?;
        Ok(debrief)
    }
}

/// Fixed low-score result for input the nonsense filter rejected. Honest
/// about why, and assembled without any model call.
fn minimum_effort_debrief(case: &CaseDefinition, simulation_id: &SimulationId) -> DebriefResult {
    let scores = case
        .competencies
        .iter()
        .map(|name| CompetencyScore {
            name: name.clone(),
            score: SCORE_MIN,
            justification:
                "The submitted justifications did not contain enough substantive reasoning to assess this competency."
                    .to_string(),
            strength: None,
            weakness: Some("Responses were too brief or repetitive to evaluate.".to_string()),
            advice: Some(
                "Re-run the simulation and explain the reasoning behind each decision in your own words."
                    .to_string(),
            ),
        })
        .collect();

    DebriefResult {
        simulation_id: simulation_id.clone(),
        scores,
        radar: RadarProjection::uniform(SCORE_MIN),
        summary: "Your submitted answers did not contain enough substance for a meaningful assessment, so the minimum score was recorded for each competency.".to_string(),
        key_insight: "A debrief is only as strong as the reasoning you put into each decision.".to_string(),
        exemplar: None,
        model_id: None,
        generated_at: Utc::now(),
    }
}
