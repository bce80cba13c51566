use super::domain::{SimulationId, SimulationState};
use crate::debrief::domain::DebriefResult;

/// Persistence collaborator: a dumb durable slot keyed by simulation id.
/// Performs no validation; serialization is the implementor's concern.
///
/// Failures are transient and retryable from the caller's perspective; the
/// workspace surfaces them as a save status rather than dropping state.
pub trait SimulationStore: Send + Sync {
    fn load_state(&self, id: &SimulationId) -> Result<Option<SimulationState>, StoreError>;
    fn persist_state(&self, id: &SimulationId, state: &SimulationState) -> Result<(), StoreError>;

    /// Existence of a stored debrief drives the generation cache: re-invoking
    /// debrief generation after success returns the stored result.
    fn load_debrief(&self, id: &SimulationId) -> Result<Option<DebriefResult>, StoreError>;
    fn persist_debrief(&self, id: &SimulationId, debrief: &DebriefResult)
        -> Result<(), StoreError>;

    /// Draft slots back the autosave timer; best-effort only.
    fn load_draft(&self, id: &SimulationId) -> Result<Option<String>, StoreError>;
    fn persist_draft(&self, id: &SimulationId, draft: &str) -> Result<(), StoreError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected write: {0}")]
    Rejected(String),
}
