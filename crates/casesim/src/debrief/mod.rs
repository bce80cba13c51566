//! Asynchronous debrief-generation pipeline for completed simulations.

pub mod clients;
pub mod domain;
pub mod generator;
pub mod parser;
pub mod poller;
pub mod prompt;
pub mod radar;

pub use clients::{JobQueueError, ModelError, ModelReply, ReasoningModel, ScoringJobs};
pub use domain::{
    CompetencyScore, DebriefResult, JobId, JobSnapshot, JobState, ScoringRequest, SCORE_MAX,
    SCORE_MID, SCORE_MIN,
};
pub use generator::{DebriefError, DebriefGenerator};
pub use parser::{parse_model_output, ParsedDebrief, RepairTier};
pub use poller::{JobPoller, PollError};
pub use prompt::{ScoringContext, EXEMPLAR_SYSTEM, SCORING_SYSTEM};
pub use radar::{map_to_axis, project, RadarAxis, RadarProjection};
