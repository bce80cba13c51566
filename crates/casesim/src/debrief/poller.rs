//! Bounded client-side polling for a submitted scoring job.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use super::clients::{JobQueueError, ScoringJobs};
use super::domain::{DebriefResult, JobId, JobState};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Polls a job on a fixed interval up to a fixed attempt budget. The future
/// suspends between polls and is cancellable by dropping it; abandoning the
/// wait leaks nothing.
#[derive(Debug, Clone)]
pub struct JobPoller {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Timeout and job failure are deliberately distinct so callers can say
/// "still processing, check back later" versus "generation failed".
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("debrief generation failed: {0}")]
    JobFailed(String),
    #[error("debrief is still processing; check back later")]
    Timeout,
    #[error(transparent)]
    Queue(#[from] JobQueueError),
}

impl JobPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Poll until the job reaches a terminal status or the attempt budget is
    /// exhausted. Either a complete result is returned, a failure is raised,
    /// or a timeout is raised. There is no partial delivery.
    pub async fn wait<J>(&self, jobs: &J, job_id: &JobId) -> Result<DebriefResult, PollError>
    where
        J: ScoringJobs + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            let snapshot = jobs.status(job_id).await?;

            match snapshot.state {
                JobState::Completed => {
                    if let Some(error) = snapshot.error {
                        return Err(PollError::JobFailed(error));
                    }
                    return snapshot.result.ok_or_else(|| {
                        PollError::JobFailed("job completed without a result payload".to_string())
                    });
                }
                JobState::Failed => {
                    let message = snapshot
                        .error
                        .unwrap_or_else(|| "job failed without detail".to_string());
                    return Err(PollError::JobFailed(message));
                }
                JobState::Pending | JobState::Processing => {
                    debug!(job = %job_id.0, attempt, "job not terminal yet");
                    if attempt < self.max_attempts {
                        sleep(self.interval).await;
                    }
                }
            }
        }

        Err(PollError::Timeout)
    }
}
