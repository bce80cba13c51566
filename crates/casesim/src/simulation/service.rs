use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use super::domain::{CaseDefinition, SimulationId, SimulationState};
use super::draft::DraftAutosave;
use super::store::{SimulationStore, StoreError};
use super::workspace::{DecisionSubmission, DecisionWorkspace, SaveStatus, SubmitOutcome, WorkspaceError};
use crate::debrief::clients::{JobQueueError, ScoringJobs};
use crate::debrief::domain::{DebriefResult, JobId, JobSnapshot, ScoringRequest};
use crate::debrief::poller::{JobPoller, PollError};

/// Facade composing the decision workspace, the scoring-job collaborator,
/// and the result poller, the surface the surrounding application calls.
pub struct SimulationService<S, J> {
    workspace: DecisionWorkspace<S>,
    store: Arc<S>,
    jobs: Arc<J>,
    poller: JobPoller,
    autosave_quiet: Duration,
    drafts: Mutex<HashMap<SimulationId, Arc<DraftAutosave<S>>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Queue(#[from] JobQueueError),
    #[error("simulation has completed {completed} of {total} stages; finish it before requesting a debrief")]
    NotYetComplete { completed: usize, total: usize },
    #[error("no simulation found for this id")]
    UnknownSimulation,
}

impl<S, J> SimulationService<S, J>
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    pub fn new(
        case: Arc<CaseDefinition>,
        store: Arc<S>,
        jobs: Arc<J>,
        poller: JobPoller,
        autosave_quiet: Duration,
    ) -> Self {
        let workspace = DecisionWorkspace::new(case, Arc::clone(&store));
        Self {
            workspace,
            store,
            jobs,
            poller,
            autosave_quiet,
            drafts: Mutex::new(HashMap::new()),
        }
    }

    pub fn case(&self) -> &CaseDefinition {
        self.workspace.case()
    }

    pub fn get_state(&self, id: &SimulationId) -> Result<Option<SimulationState>, ServiceError> {
        Ok(self.workspace.get_state(id)?)
    }

    /// Submit the current stage; a successful advance cancels any pending
    /// draft autosave so stale text never trails into the next stage.
    pub fn submit_decision(
        &self,
        id: &SimulationId,
        submission: DecisionSubmission,
    ) -> Result<SubmitOutcome, ServiceError> {
        let outcome = self.workspace.submit_decision(id, submission)?;

        if matches!(
            outcome,
            SubmitOutcome::Advanced { .. } | SubmitOutcome::Completed { .. }
        ) {
            if let Some(autosave) = self.drafts.lock().expect("drafts mutex poisoned").get(id) {
                autosave.cancel();
            }
        }

        Ok(outcome)
    }

    pub fn dismiss_paywall(&self, id: &SimulationId) -> Result<SimulationState, ServiceError> {
        Ok(self.workspace.dismiss_paywall(id)?)
    }

    /// Feed a keystroke into the debounced draft autosaver for this run.
    /// Returns the save-status channel for the UI indicator.
    pub fn record_draft(&self, id: &SimulationId, text: String) -> watch::Receiver<SaveStatus> {
        let autosave = {
            let mut drafts = self.drafts.lock().expect("drafts mutex poisoned");
            Arc::clone(drafts.entry(id.clone()).or_insert_with(|| {
                Arc::new(DraftAutosave::new(
                    Arc::clone(&self.store),
                    id.clone(),
                    self.autosave_quiet,
                ))
            }))
        };

        autosave.record_keystroke(text);
        autosave.status()
    }

    /// Submit the finished simulation for scoring; returns a job id
    /// immediately. Requires every stage to be decided.
    pub async fn complete_simulation(&self, id: &SimulationId) -> Result<JobId, ServiceError> {
        let state = self
            .workspace
            .get_state(id)?
            .ok_or(ServiceError::UnknownSimulation)?;

        let total = self.workspace.case().total_stages();
        if !state.is_complete(total) {
            return Err(ServiceError::NotYetComplete {
                completed: state.decisions.len(),
                total,
            });
        }

        let job_id = self
            .jobs
            .enqueue(ScoringRequest {
                simulation_id: id.clone(),
            })
            .await?;
        Ok(job_id)
    }

    /// One status snapshot, for callers doing their own polling cadence.
    pub async fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, ServiceError> {
        Ok(self.jobs.status(job_id).await?)
    }

    /// Block until the job reaches a terminal status, per the poller's
    /// interval and attempt budget.
    pub async fn await_result(&self, job_id: &JobId) -> Result<DebriefResult, PollError> {
        self.poller.wait(self.jobs.as_ref(), job_id).await
    }

    /// Stored debrief, if one was already generated for this run.
    pub fn stored_debrief(&self, id: &SimulationId) -> Result<Option<DebriefResult>, ServiceError> {
        Ok(self.store.load_debrief(id)?)
    }
}
