use async_trait::async_trait;
use casesim::debrief::{
    DebriefGenerator, DebriefResult, JobId, JobQueueError, JobSnapshot, ModelError, ModelReply,
    ReasoningModel, ScoringJobs, ScoringRequest, SCORING_SYSTEM,
};
use casesim::simulation::{
    CaseDefinition, DecisionKind, DecisionOption, DecisionPoint, DecisionPointId, PersonaRef,
    RubricCriterion, SimulationId, SimulationState, SimulationStore, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemorySimulationStore {
    states: Mutex<HashMap<SimulationId, SimulationState>>,
    debriefs: Mutex<HashMap<SimulationId, DebriefResult>>,
    drafts: Mutex<HashMap<SimulationId, String>>,
}

impl SimulationStore for InMemorySimulationStore {
    fn load_state(&self, id: &SimulationId) -> Result<Option<SimulationState>, StoreError> {
        let guard = self.states.lock().expect("state mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn persist_state(&self, id: &SimulationId, state: &SimulationState) -> Result<(), StoreError> {
        let mut guard = self.states.lock().expect("state mutex poisoned");
        guard.insert(id.clone(), state.clone());
        Ok(())
    }

    fn load_debrief(&self, id: &SimulationId) -> Result<Option<DebriefResult>, StoreError> {
        let guard = self.debriefs.lock().expect("debrief mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn persist_debrief(
        &self,
        id: &SimulationId,
        debrief: &DebriefResult,
    ) -> Result<(), StoreError> {
        let mut guard = self.debriefs.lock().expect("debrief mutex poisoned");
        guard.insert(id.clone(), debrief.clone());
        Ok(())
    }

    fn load_draft(&self, id: &SimulationId) -> Result<Option<String>, StoreError> {
        let guard = self.drafts.lock().expect("draft mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn persist_draft(&self, id: &SimulationId, draft: &str) -> Result<(), StoreError> {
        let mut guard = self.drafts.lock().expect("draft mutex poisoned");
        guard.insert(id.clone(), draft.to_string());
        Ok(())
    }
}

/// Stand-in for the hosted reasoning model: answers the scoring prompt with
/// a canned fenced-JSON assessment and everything else with prose, so the
/// service runs end to end without an upstream account.
#[derive(Default)]
pub(crate) struct ScriptedModelClient {
    calls: AtomicUsize,
}

impl ScriptedModelClient {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ReasoningModel for ScriptedModelClient {
    async fn complete(&self, system: &str, _prompt: &str) -> Result<ModelReply, ModelError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let text = if system == SCORING_SYSTEM {
            SCRIPTED_SCORING_REPLY.to_string()
        } else {
            SCRIPTED_EXEMPLAR_REPLY.to_string()
        };

        Ok(ModelReply {
            text,
            model_id: "scripted-local".to_string(),
        })
    }
}

pub(crate) const SCRIPTED_SCORING_REPLY: &str = r#"```json
{"scores":[{"competencyName":"Strategic Thinking","score":4.0,"justification":"Decisions were sequenced around a coherent expansion thesis.","strength":"Consistent framing across stages","weakness":"Little distinction between reversible and irreversible moves","actionableAdvice":"State which commitments you could unwind if the market shifts."},{"competencyName":"Financial Acumen","score":3.5,"justification":"Margin and runway reasoning was present but volume assumptions went unexamined."},{"competencyName":"Market Awareness","score":3.0,"justification":"Competitor reactions were acknowledged once and then dropped."},{"competencyName":"Risk Management","score":3.5,"justification":"Named the regulatory exposure and proposed a concrete mitigation."},{"competencyName":"Leadership Judgment","score":4.0,"justification":"Brought the CFO along with evidence rather than authority."}],"keyInsight":"You treated the expansion as a portfolio of bets rather than a single commitment.","summaryText":"A disciplined run: each decision tied back to the expansion thesis, with finance and leadership as the strongest threads."}
```"#;

const SCRIPTED_EXEMPLAR_REPLY: &str = "A model answer would open with the unit economics of the \
    flagship market, commit to the phased entry while naming the trigger for accelerating, and \
    close by assigning the CFO ownership of the runway guardrail.";

/// In-process queue: enqueue records a pending job and spawns the generator
/// on the runtime; pollers observe pending -> processing -> terminal.
pub(crate) struct InProcessScoringJobs<S, M> {
    generator: Arc<DebriefGenerator<S, M>>,
    case: Arc<CaseDefinition>,
    snapshots: Arc<Mutex<HashMap<JobId, JobSnapshot>>>,
    next_id: AtomicU64,
}

impl<S, M> InProcessScoringJobs<S, M>
where
    S: SimulationStore + 'static,
    M: ReasoningModel + 'static,
{
    pub(crate) fn new(generator: DebriefGenerator<S, M>, case: Arc<CaseDefinition>) -> Self {
        Self {
            generator: Arc::new(generator),
            case,
            snapshots: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    fn record(snapshots: &Mutex<HashMap<JobId, JobSnapshot>>, id: &JobId, snapshot: JobSnapshot) {
        snapshots
            .lock()
            .expect("job mutex poisoned")
            .insert(id.clone(), snapshot);
    }
}

#[async_trait]
impl<S, M> ScoringJobs for InProcessScoringJobs<S, M>
where
    S: SimulationStore + 'static,
    M: ReasoningModel + 'static,
{
    async fn enqueue(&self, request: ScoringRequest) -> Result<JobId, JobQueueError> {
        let job_id = JobId(format!(
            "job-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));
        Self::record(&self.snapshots, &job_id, JobSnapshot::pending());

        let generator = Arc::clone(&self.generator);
        let case = Arc::clone(&self.case);
        let snapshots = Arc::clone(&self.snapshots);
        let worker_id = job_id.clone();

        tokio::spawn(async move {
            Self::record(&snapshots, &worker_id, JobSnapshot::processing());
            match generator.generate(&case, &request.simulation_id).await {
                Ok(result) => {
                    info!(job = %worker_id.0, simulation = %request.simulation_id.0, "debrief job completed");
                    Self::record(&snapshots, &worker_id, JobSnapshot::completed(result));
                }
                Err(err) => {
                    error!(job = %worker_id.0, error = %err, "debrief job failed");
                    Self::record(&snapshots, &worker_id, JobSnapshot::failed(err.to_string()));
                }
            }
        });

        Ok(job_id)
    }

    async fn status(&self, id: &JobId) -> Result<JobSnapshot, JobQueueError> {
        self.snapshots
            .lock()
            .expect("job mutex poisoned")
            .get(id)
            .cloned()
            .ok_or(JobQueueError::UnknownJob)
    }
}

/// The bundled three-stage expansion case.
pub(crate) fn sample_case() -> CaseDefinition {
    CaseDefinition {
        id: "northwind-expansion".to_string(),
        title: "Northwind Foods: The Expansion Decision".to_string(),
        paywall_gated: false,
        decision_points: vec![
            DecisionPoint {
                index: 0,
                id: DecisionPointId("entry-mode".to_string()),
                title: "Choose the market entry mode".to_string(),
                prompt: "Northwind can enter the coastal market by acquiring a regional brand, \
                         partnering with an established distributor, or building its own \
                         presence. Which entry mode do you commit to?"
                    .to_string(),
                kind: DecisionKind::MultipleChoice,
                options: vec![
                    DecisionOption {
                        id: "acquire".to_string(),
                        label: "Acquire the regional brand".to_string(),
                    },
                    DecisionOption {
                        id: "partner".to_string(),
                        label: "Partner with the distributor".to_string(),
                    },
                    DecisionOption {
                        id: "organic".to_string(),
                        label: "Build organically".to_string(),
                    },
                ],
                rubric_keys: vec!["strategy".to_string(), "market".to_string()],
                persona: None,
            },
            DecisionPoint {
                index: 1,
                id: DecisionPointId("cfo-alignment".to_string()),
                title: "Align the CFO on funding".to_string(),
                prompt: "Your CFO is skeptical about funding the entry before the flagship \
                         market is cash-flow positive. Talk it through, then state how you \
                         will fund the expansion."
                    .to_string(),
                kind: DecisionKind::FreeText,
                options: Vec::new(),
                rubric_keys: vec!["financial".to_string(), "leadership".to_string()],
                persona: Some(PersonaRef {
                    id: "cfo-ortega".to_string(),
                    name: "Marisol Ortega".to_string(),
                    role: "Chief Financial Officer".to_string(),
                }),
            },
            DecisionPoint {
                index: 2,
                id: DecisionPointId("rollout-pace".to_string()),
                title: "Set the rollout pace".to_string(),
                prompt: "Commit to a rollout pace for the first year.".to_string(),
                kind: DecisionKind::MultipleChoice,
                options: vec![
                    DecisionOption {
                        id: "phased".to_string(),
                        label: "Phased: two cities, then review".to_string(),
                    },
                    DecisionOption {
                        id: "blitz".to_string(),
                        label: "Blitz: all five cities at once".to_string(),
                    },
                ],
                rubric_keys: vec!["risk".to_string(), "strategy".to_string()],
                persona: None,
            },
        ],
        rubric: vec![
            RubricCriterion {
                name: "Strategic Thinking".to_string(),
                description: "Coherence of the entry thesis across all three decisions"
                    .to_string(),
            },
            RubricCriterion {
                name: "Financial Acumen".to_string(),
                description: "Quality of funding and margin reasoning".to_string(),
            },
            RubricCriterion {
                name: "Risk Management".to_string(),
                description: "Identification and mitigation of downside scenarios".to_string(),
            },
        ],
        competencies: vec![
            "Strategic Thinking".to_string(),
            "Financial Acumen".to_string(),
            "Market Awareness".to_string(),
            "Risk Management".to_string(),
            "Leadership Judgment".to_string(),
        ],
    }
}
