//! Collaborator contracts for the external reasoning model and job queue.
//!
//! Both are injected rather than reached through globals so tests can
//! substitute fakes that return controlled malformed output or scripted job
//! lifecycles.

use async_trait::async_trait;

use super::domain::{JobId, JobSnapshot, ScoringRequest};

/// Black-box text-completion endpoint. The returned text may or may not be
/// valid JSON; the repair parser deals with that.
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<ModelReply, ModelError>;
}

#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    /// Model identifier string, recorded for logging.
    pub model_id: String,
}

/// The model call itself failed at the network/HTTP level. Terminal for the
/// current debrief-generation attempt; the caller may retry the whole
/// completion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("reasoning model call failed: {0}")]
    Call(String),
}

/// Asynchronous scoring-job collaborator: accepts a request and returns a
/// job id immediately; exposes status-by-id for the poller.
#[async_trait]
pub trait ScoringJobs: Send + Sync {
    async fn enqueue(&self, request: ScoringRequest) -> Result<JobId, JobQueueError>;
    async fn status(&self, id: &JobId) -> Result<JobSnapshot, JobQueueError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum JobQueueError {
    #[error("unknown job id")]
    UnknownJob,
    #[error("job queue unavailable: {0}")]
    Unavailable(String),
}
