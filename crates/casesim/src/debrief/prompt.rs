//! Pure prompt templates for the scoring and exemplar calls.
//!
//! Prompt construction is a function of a typed context record so it can be
//! tested independently of any network call.

use crate::simulation::domain::{
    CaseDefinition, RubricCriterion, SimulationState, SpeakerRole, TranscriptEntry,
};

pub const SCORING_SYSTEM: &str = "You are an executive-education assessor. Respond with a single JSON object and nothing else.";

pub const EXEMPLAR_SYSTEM: &str =
    "You are an executive-education coach. Respond with plain prose, no JSON.";

const DECISION_SEPARATOR: &str = "\n---\n";

/// Typed context the scoring prompt is rendered from.
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    pub case_title: &'a str,
    pub decisions: Vec<DecisionNarrative<'a>>,
    pub rubric: &'a [RubricCriterion],
    pub competencies: &'a [String],
}

/// One decision flattened for prompt assembly.
#[derive(Debug, Clone)]
pub struct DecisionNarrative<'a> {
    pub stage_title: &'a str,
    pub selected_option: Option<&'a str>,
    pub justification: &'a str,
    pub transcript: &'a [TranscriptEntry],
}

impl<'a> ScoringContext<'a> {
    pub fn from_simulation(case: &'a CaseDefinition, state: &'a SimulationState) -> Self {
        let decisions = state
            .decisions
            .iter()
            .map(|decision| {
                let point = case
                    .decision_points
                    .iter()
                    .find(|point| point.id == decision.decision_point_id);
                let stage_title = point.map(|point| point.title.as_str()).unwrap_or("Decision");
                let selected_option = decision.selected_option.as_deref().and_then(|option_id| {
                    point
                        .and_then(|point| point.option_label(option_id))
                        .or(Some(option_id))
                });

                DecisionNarrative {
                    stage_title,
                    selected_option,
                    justification: &decision.justification,
                    transcript: &decision.transcript,
                }
            })
            .collect();

        Self {
            case_title: &case.title,
            decisions,
            rubric: &case.rubric,
            competencies: &case.competencies,
        }
    }

    /// Render the single structured scoring prompt.
    pub fn render_scoring_prompt(&self) -> String {
        let mut prompt = String::new();
        prompt.push_str(&format!(
            "Assess the participant's performance in the case \"{}\".\n\n",
            self.case_title
        ));

        prompt.push_str("Decisions made:\n");
        let rendered: Vec<String> = self
            .decisions
            .iter()
            .enumerate()
            .map(|(index, decision)| render_decision(index, decision))
            .collect();
        prompt.push_str(&rendered.join(DECISION_SEPARATOR));

        prompt.push_str("\n\nRubric criteria:\n");
        for criterion in self.rubric {
            prompt.push_str(&format!("- {}: {}\n", criterion.name, criterion.description));
        }

        prompt.push_str("\nScore each of these competencies from 1 to 5:\n");
        for competency in self.competencies {
            prompt.push_str(&format!("- {competency}\n"));
        }

        prompt.push_str(
            "\nReturn exactly one JSON object of the form:\n\
             {\"scores\": [{\"competencyName\": \"...\", \"score\": 1-5, \
             \"justification\": \"...\", \"strength\": \"...\", \
             \"weakness\": \"...\", \"actionableAdvice\": \"...\"}], \
             \"keyInsight\": \"...\", \"summaryText\": \"...\"}\n",
        );

        prompt
    }

    /// Render the best-effort "gold standard" exemplar prompt.
    pub fn render_exemplar_prompt(&self) -> String {
        let mut prompt = String::new();
        prompt.push_str(&format!(
            "Write a short gold-standard answer for the case \"{}\" that a top participant \
             would have given, covering these decisions:\n",
            self.case_title
        ));
        for decision in &self.decisions {
            prompt.push_str(&format!("- {}\n", decision.stage_title));
        }
        prompt.push_str("Keep it under 200 words and make it concrete.\n");
        prompt
    }
}

fn render_decision(index: usize, decision: &DecisionNarrative<'_>) -> String {
    let mut section = format!("Decision {}: {}\n", index + 1, decision.stage_title);

    if let Some(option) = decision.selected_option {
        section.push_str(&format!("Selected option: {option}\n"));
    }
    section.push_str(&format!("Justification: {}\n", decision.justification));

    if !decision.transcript.is_empty() {
        section.push_str("Role-play transcript:\n");
        for entry in decision.transcript {
            let speaker = match entry.speaker {
                SpeakerRole::Participant => "Participant",
                SpeakerRole::Persona => "Persona",
            };
            section.push_str(&format!("  {speaker}: {}\n", entry.message));
        }
    }

    section
}
