//! Integration specifications for the debrief pipeline: generation through
//! scripted model replies, job polling, and the full submit-to-debrief path
//! across the service facade.

mod common {
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use casesim::debrief::{
        DebriefGenerator, DebriefResult, JobId, JobQueueError, JobSnapshot, ModelError, ModelReply,
        ReasoningModel, ScoringJobs, ScoringRequest,
    };
    use casesim::simulation::{
        CaseDefinition, DecisionKind, DecisionOption, DecisionPoint, DecisionPointId,
        RubricCriterion, SimulationId, SimulationState, SimulationStore, StoreError, UserDecision,
    };
    use chrono::Utc;

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        states: Mutex<HashMap<SimulationId, SimulationState>>,
        debriefs: Mutex<HashMap<SimulationId, DebriefResult>>,
        drafts: Mutex<HashMap<SimulationId, String>>,
    }

    impl SimulationStore for MemoryStore {
        fn load_state(&self, id: &SimulationId) -> Result<Option<SimulationState>, StoreError> {
            Ok(self.states.lock().expect("lock").get(id).cloned())
        }

        fn persist_state(
            &self,
            id: &SimulationId,
            state: &SimulationState,
        ) -> Result<(), StoreError> {
            self.states
                .lock()
                .expect("lock")
                .insert(id.clone(), state.clone());
            Ok(())
        }

        fn load_debrief(&self, id: &SimulationId) -> Result<Option<DebriefResult>, StoreError> {
            Ok(self.debriefs.lock().expect("lock").get(id).cloned())
        }

        fn persist_debrief(
            &self,
            id: &SimulationId,
            debrief: &DebriefResult,
        ) -> Result<(), StoreError> {
            self.debriefs
                .lock()
                .expect("lock")
                .insert(id.clone(), debrief.clone());
            Ok(())
        }

        fn load_draft(&self, id: &SimulationId) -> Result<Option<String>, StoreError> {
            Ok(self.drafts.lock().expect("lock").get(id).cloned())
        }

        fn persist_draft(&self, id: &SimulationId, draft: &str) -> Result<(), StoreError> {
            self.drafts
                .lock()
                .expect("lock")
                .insert(id.clone(), draft.to_string());
            Ok(())
        }
    }

    /// Replays a queue of scripted replies and counts calls.
    #[derive(Default)]
    pub(crate) struct ScriptedModel {
        replies: Mutex<VecDeque<Result<ModelReply, ModelError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        pub(crate) fn with_replies(
            replies: impl IntoIterator<Item = Result<ModelReply, ModelError>>,
        ) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl ReasoningModel for ScriptedModel {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<ModelReply, ModelError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::Call("no scripted reply left".to_string())))
        }
    }

    pub(crate) fn reply(text: &str) -> Result<ModelReply, ModelError> {
        Ok(ModelReply {
            text: text.to_string(),
            model_id: "scripted-v1".to_string(),
        })
    }

    pub(crate) const SCORING_REPLY: &str = r#"```json
{"scores":[{"competencyName":"Strategic Thinking","score":4.5,"justification":"Sequenced the rollout around existing strengths.","strength":"Clear framing","weakness":"Limited contingency planning","actionableAdvice":"Stress-test the plan against a competitor response."},{"competencyName":"Financial Acumen","score":3.5,"justification":"Margin reasoning was sound but volume assumptions were optimistic."},{"competencyName":"Leadership Judgment","score":4.0,"justification":"Brought the CFO along with evidence rather than authority."}],"keyInsight":"You anchored every decision in margin protection.","summaryText":"A disciplined, finance-first run through the case."}
```"#;

    pub(crate) fn case() -> CaseDefinition {
        CaseDefinition {
            id: "meridian".to_string(),
            title: "Meridian Turnaround".to_string(),
            paywall_gated: false,
            decision_points: vec![
                DecisionPoint {
                    index: 0,
                    id: DecisionPointId("dp-pricing".to_string()),
                    title: "Set the launch pricing".to_string(),
                    prompt: "Which pricing posture should Meridian take?".to_string(),
                    kind: DecisionKind::MultipleChoice,
                    options: vec![DecisionOption {
                        id: "premium".to_string(),
                        label: "Premium positioning".to_string(),
                    }],
                    rubric_keys: vec!["financial".to_string()],
                    persona: None,
                },
                DecisionPoint {
                    index: 1,
                    id: DecisionPointId("dp-rollout".to_string()),
                    title: "Choose the rollout sequence".to_string(),
                    prompt: "Which region launches first?".to_string(),
                    kind: DecisionKind::MultipleChoice,
                    options: vec![DecisionOption {
                        id: "east".to_string(),
                        label: "Eastern region first".to_string(),
                    }],
                    rubric_keys: vec!["strategy".to_string()],
                    persona: None,
                },
            ],
            rubric: vec![RubricCriterion {
                name: "Strategic Thinking".to_string(),
                description: "Coherence of the overall plan".to_string(),
            }],
            competencies: vec![
                "Strategic Thinking".to_string(),
                "Financial Acumen".to_string(),
                "Leadership Judgment".to_string(),
            ],
        }
    }

    /// A finished run with one justification per stage.
    pub(crate) fn completed_state(justifications: &[&str]) -> SimulationState {
        let mut state = SimulationState::new(Utc::now());
        for (point, justification) in ["dp-pricing", "dp-rollout"].iter().zip(justifications) {
            state.decisions.push(UserDecision {
                decision_point_id: DecisionPointId(point.to_string()),
                selected_option: Some("premium".to_string()),
                justification: justification.to_string(),
                transcript: Vec::new(),
            });
        }
        state.current_stage = state.decisions.len();
        state.completed = true;
        state
    }

    /// Distinct per-stage reasoning; varied enough to clear the low-effort
    /// filter even when concatenated.
    pub(crate) const SUBSTANTIVE: [&str; 2] = [
        "Premium positioning protects gross margin while the brand is strongest and lets us discount selectively later without retraining buyers.",
        "Launching in the eastern region first exploits our existing distribution relationships and gives operations a contained market to tune fulfillment.",
    ];

    pub(crate) fn seeded_store(id: &SimulationId, justifications: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store
            .persist_state(id, &completed_state(justifications))
            .expect("seed state");
        store
    }

    pub(crate) fn generator(
        store: &Arc<MemoryStore>,
        model: &Arc<ScriptedModel>,
    ) -> DebriefGenerator<MemoryStore, ScriptedModel> {
        DebriefGenerator::new(Arc::clone(store), Arc::clone(model))
    }

    /// Queue fake that replays a fixed sequence of status snapshots, holding
    /// the last one once the script runs out.
    pub(crate) struct SequencedJobs {
        snapshots: Vec<JobSnapshot>,
        cursor: AtomicUsize,
    }

    impl SequencedJobs {
        pub(crate) fn new(snapshots: Vec<JobSnapshot>) -> Self {
            Self {
                snapshots,
                cursor: AtomicUsize::new(0),
            }
        }

        pub(crate) fn polls(&self) -> usize {
            self.cursor.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl ScoringJobs for SequencedJobs {
        async fn enqueue(&self, _request: ScoringRequest) -> Result<JobId, JobQueueError> {
            Ok(JobId("job-sequenced".to_string()))
        }

        async fn status(&self, _id: &JobId) -> Result<JobSnapshot, JobQueueError> {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed);
            let index = index.min(self.snapshots.len() - 1);
            Ok(self.snapshots[index].clone())
        }
    }

    /// Queue fake that runs the generator inline during enqueue, so a job is
    /// already terminal by the first poll.
    pub(crate) struct InlineJobs {
        generator: DebriefGenerator<MemoryStore, ScriptedModel>,
        case: CaseDefinition,
        snapshots: Mutex<HashMap<JobId, JobSnapshot>>,
        next_id: AtomicUsize,
    }

    impl InlineJobs {
        pub(crate) fn new(
            generator: DebriefGenerator<MemoryStore, ScriptedModel>,
            case: CaseDefinition,
        ) -> Self {
            Self {
                generator,
                case,
                snapshots: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(1),
            }
        }
    }

    #[async_trait]
    impl ScoringJobs for InlineJobs {
        async fn enqueue(&self, request: ScoringRequest) -> Result<JobId, JobQueueError> {
            let id = JobId(format!("job-{}", self.next_id.fetch_add(1, Ordering::Relaxed)));
            let snapshot = match self
                .generator
                .generate(&self.case, &request.simulation_id)
                .await
            {
                Ok(result) => JobSnapshot::completed(result),
                Err(err) => JobSnapshot::failed(err.to_string()),
            };
            self.snapshots
                .lock()
                .expect("lock")
                .insert(id.clone(), snapshot);
            Ok(id)
        }

        async fn status(&self, id: &JobId) -> Result<JobSnapshot, JobQueueError> {
            self.snapshots
                .lock()
                .expect("lock")
                .get(id)
                .cloned()
                .ok_or(JobQueueError::UnknownJob)
        }
    }
}

mod generation {
    use super::common::*;
    use casesim::debrief::{DebriefError, ModelError, SCORE_MID, SCORE_MIN};
    use casesim::simulation::SimulationId;
    use std::sync::Arc;

    #[tokio::test]
    async fn nonsense_justifications_never_reach_the_model() {
        let id = SimulationId("sim-nonsense".to_string());
        let store = seeded_store(&id, &["aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"; 2]);
        let model = Arc::new(ScriptedModel::with_replies([reply(SCORING_REPLY)]));

        let debrief = generator(&store, &model)
            .generate(&case(), &id)
            .await
            .expect("fallback debrief generated");

        assert_eq!(model.calls(), 0);
        assert_eq!(debrief.scores.len(), 3);
        assert!(debrief.scores.iter().all(|score| score.score == SCORE_MIN));
        assert_eq!(debrief.radar.strategic_thinking, SCORE_MIN);
        assert_eq!(debrief.radar.financial_acumen, SCORE_MIN);
        assert!(debrief.model_id.is_none());
    }

    #[tokio::test]
    async fn well_formed_reply_yields_scores_radar_and_exemplar() {
        let id = SimulationId("sim-clean".to_string());
        let store = seeded_store(&id, &SUBSTANTIVE);
        let model = Arc::new(ScriptedModel::with_replies([
            reply(SCORING_REPLY),
            reply("An exemplar answer would open with the margin math."),
        ]));

        let debrief = generator(&store, &model)
            .generate(&case(), &id)
            .await
            .expect("debrief generated");

        assert_eq!(model.calls(), 2);
        assert_eq!(debrief.scores.len(), 3);
        assert_eq!(debrief.radar.strategic_thinking, 4.5);
        assert_eq!(debrief.radar.financial_acumen, 3.5);
        assert_eq!(debrief.radar.leadership_judgment, 4.0);
        assert_eq!(debrief.radar.risk_management, 0.0);
        assert_eq!(
            debrief.key_insight,
            "You anchored every decision in margin protection."
        );
        assert!(debrief.exemplar.is_some());
        assert_eq!(debrief.model_id.as_deref(), Some("scripted-v1"));
    }

    #[tokio::test]
    async fn truncated_reply_is_repaired_rather_than_discarded() {
        let id = SimulationId("sim-truncated".to_string());
        let store = seeded_store(&id, &SUBSTANTIVE);
        let truncated = r#"{"scores":[{"competencyName":"Strategic Thinking","score":4.0,"justification":"Solid sequencing"},"#;
        let model = Arc::new(ScriptedModel::with_replies([
            reply(truncated),
            reply("Exemplar."),
        ]));

        let debrief = generator(&store, &model)
            .generate(&case(), &id)
            .await
            .expect("debrief generated");

        assert_eq!(debrief.scores.len(), 1);
        assert_eq!(debrief.scores[0].score, 4.0);
        assert_eq!(debrief.radar.strategic_thinking, 4.0);
    }

    #[tokio::test]
    async fn unparseable_reply_produces_neutral_scores() {
        let id = SimulationId("sim-garbage".to_string());
        let store = seeded_store(&id, &SUBSTANTIVE);
        let model = Arc::new(ScriptedModel::with_replies([
            reply("I am sorry, I cannot respond in JSON today."),
            reply("Exemplar."),
        ]));

        let debrief = generator(&store, &model)
            .generate(&case(), &id)
            .await
            .expect("debrief generated");

        assert_eq!(debrief.scores.len(), 3);
        assert!(debrief.scores.iter().all(|score| score.score == SCORE_MID));
        assert!(!debrief.summary.is_empty());
    }

    #[tokio::test]
    async fn exemplar_failure_does_not_block_the_result() {
        let id = SimulationId("sim-no-exemplar".to_string());
        let store = seeded_store(&id, &SUBSTANTIVE);
        let model = Arc::new(ScriptedModel::with_replies([
            reply(SCORING_REPLY),
            Err(ModelError::Call("exemplar endpoint down".to_string())),
        ]));

        let debrief = generator(&store, &model)
            .generate(&case(), &id)
            .await
            .expect("primary result survives exemplar failure");

        assert!(debrief.exemplar.is_none());
        assert_eq!(debrief.scores.len(), 3);
    }

    #[tokio::test]
    async fn scoring_call_failure_is_terminal() {
        let id = SimulationId("sim-model-down".to_string());
        let store = seeded_store(&id, &SUBSTANTIVE);
        let model = Arc::new(ScriptedModel::with_replies([Err(ModelError::Call(
            "connection refused".to_string(),
        ))]));

        let error = generator(&store, &model)
            .generate(&case(), &id)
            .await
            .expect_err("scoring failure propagates");

        assert!(matches!(error, DebriefError::Model(_)));
    }

    #[tokio::test]
    async fn incomplete_simulation_is_refused() {
        let id = SimulationId("sim-early".to_string());
        let store = seeded_store(&id, &SUBSTANTIVE);
        let model = Arc::new(ScriptedModel::default());

        // Seed a case with a third stage the stored run never reached.
        let mut bigger = case();
        bigger.decision_points.push(bigger.decision_points[0].clone());

        let error = generator(&store, &model)
            .generate(&bigger, &id)
            .await
            .expect_err("incomplete run refused");

        assert!(matches!(
            error,
            DebriefError::SimulationIncomplete {
                completed: 2,
                total: 3
            }
        ));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn second_generation_returns_the_stored_result_without_model_calls() {
        let id = SimulationId("sim-cached".to_string());
        let store = seeded_store(&id, &SUBSTANTIVE);
        let model = Arc::new(ScriptedModel::with_replies([
            reply(SCORING_REPLY),
            reply("Exemplar."),
        ]));
        let generator = generator(&store, &model);

        let first = generator
            .generate(&case(), &id)
            .await
            .expect("first generation");
        assert_eq!(model.calls(), 2);

        let second = generator
            .generate(&case(), &id)
            .await
            .expect("second generation");
        assert_eq!(model.calls(), 2);
        assert_eq!(first, second);
    }
}

mod polling {
    use super::common::*;
    use casesim::debrief::{JobId, JobPoller, JobSnapshot, PollError};
    use casesim::simulation::SimulationId;
    use std::time::Duration;

    fn completed_snapshot() -> JobSnapshot {
        // A minimal but structurally complete result payload.
        JobSnapshot::completed(casesim::debrief::DebriefResult {
            simulation_id: SimulationId("sim-poll".to_string()),
            scores: Vec::new(),
            radar: casesim::debrief::RadarProjection::default(),
            summary: "done".to_string(),
            key_insight: String::new(),
            exemplar: None,
            model_id: None,
            generated_at: chrono::Utc::now(),
        })
    }

    fn fast_poller(max_attempts: u32) -> JobPoller {
        JobPoller::new(Duration::from_millis(1), max_attempts)
    }

    #[tokio::test]
    async fn completion_on_the_final_attempt_still_succeeds() {
        let mut script = vec![JobSnapshot::processing(); 4];
        script.push(completed_snapshot());
        let jobs = SequencedJobs::new(script);

        let result = fast_poller(5)
            .wait(&jobs, &JobId("job-sequenced".to_string()))
            .await
            .expect("completed on the last allowed poll");

        assert_eq!(result.summary, "done");
        assert_eq!(jobs.polls(), 5);
    }

    #[tokio::test]
    async fn attempt_budget_exhaustion_is_a_timeout_not_a_failure() {
        let jobs = SequencedJobs::new(vec![JobSnapshot::processing()]);

        let error = fast_poller(5)
            .wait(&jobs, &JobId("job-sequenced".to_string()))
            .await
            .expect_err("never completes");

        assert!(matches!(error, PollError::Timeout));
        assert_eq!(jobs.polls(), 5);
    }

    #[tokio::test]
    async fn failed_job_reports_the_queue_error_message() {
        let jobs = SequencedJobs::new(vec![
            JobSnapshot::processing(),
            JobSnapshot::failed("model quota exhausted"),
        ]);

        let error = fast_poller(10)
            .wait(&jobs, &JobId("job-sequenced".to_string()))
            .await
            .expect_err("job failed");

        match error {
            PollError::JobFailed(message) => assert!(message.contains("model quota exhausted")),
            other => panic!("expected job failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn already_completed_job_returns_on_the_first_poll() {
        let jobs = SequencedJobs::new(vec![completed_snapshot()]);

        fast_poller(60)
            .wait(&jobs, &JobId("job-sequenced".to_string()))
            .await
            .expect("instant completion");

        assert_eq!(jobs.polls(), 1);
    }
}

mod end_to_end {
    use super::common::*;
    use casesim::debrief::JobPoller;
    use casesim::simulation::{
        DecisionPointId, DecisionSubmission, SimulationId, SimulationService, SubmitOutcome,
    };
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn a_finished_run_flows_from_submission_to_scored_debrief() {
        let store = Arc::new(MemoryStore::default());
        let model = Arc::new(ScriptedModel::with_replies([
            reply(SCORING_REPLY),
            reply("An exemplar answer would open with the margin math."),
        ]));
        let jobs = Arc::new(InlineJobs::new(generator(&store, &model), case()));
        let service = SimulationService::new(
            Arc::new(case()),
            store,
            jobs,
            JobPoller::new(Duration::from_millis(1), 5),
            Duration::from_millis(50),
        );

        let id = SimulationId("sim-e2e".to_string());
        let stages = [("dp-pricing", "premium"), ("dp-rollout", "east")];
        for ((point, option), justification) in stages.iter().zip(SUBSTANTIVE) {
            let outcome = service
                .submit_decision(
                    &id,
                    DecisionSubmission {
                        decision_point_id: DecisionPointId(point.to_string()),
                        selected_option: Some(option.to_string()),
                        justification: justification.to_string(),
                        transcript: Vec::new(),
                        persona_opened: false,
                    },
                )
                .expect("submission accepted");
            assert!(matches!(
                outcome,
                SubmitOutcome::Advanced { .. } | SubmitOutcome::Completed { .. }
            ));
        }

        let job_id = service
            .complete_simulation(&id)
            .await
            .expect("completed run enqueues a scoring job");

        let debrief = service
            .await_result(&job_id)
            .await
            .expect("debrief delivered");

        assert_eq!(debrief.simulation_id, id);
        assert_eq!(debrief.scores.len(), 3);
        assert!(!debrief.summary.is_empty());
        assert!(debrief.radar.strategic_thinking > 0.0);
        // Both the scoring and exemplar calls must have gone to the model;
        // zero calls would mean the low-effort filter intercepted the run.
        assert_eq!(model.calls(), 2);
        assert_eq!(debrief.model_id.as_deref(), Some("scripted-v1"));

        let stored = service
            .stored_debrief(&id)
            .expect("store reachable")
            .expect("debrief persisted");
        assert_eq!(stored, debrief);
    }
}
