//! Decision-point state machine, justification validation, and persistence.

pub mod domain;
pub mod draft;
pub mod router;
pub mod service;
pub mod store;
pub mod validation;
pub mod workspace;

pub use domain::{
    CaseDefinition, DecisionKind, DecisionOption, DecisionPoint, DecisionPointId, PersonaRef,
    RubricCriterion, SimulationId, SimulationState, SpeakerRole, TranscriptEntry, UserDecision,
};
pub use draft::DraftAutosave;
pub use router::simulation_router;
pub use service::{ServiceError, SimulationService};
pub use store::{SimulationStore, StoreError};
pub use validation::{validate_justification, JustificationIssue};
pub use workspace::{
    DecisionSubmission, DecisionWorkspace, PaywallPreview, SaveStatus, SubmissionRejection,
    SubmitOutcome, WorkspaceError,
};
