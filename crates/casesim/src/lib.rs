//! Case-simulation decision engine and asynchronous debrief pipeline.
//!
//! The `simulation` module owns the multi-stage decision workflow: an ordered
//! sequence of decision points the participant advances through, with
//! justification validation, paywall gating, and resumable persisted state.
//! The `debrief` module turns a finished simulation into a scored debrief via
//! an external reasoning model, defended by a nonsense filter, a repair parser
//! for malformed model output, and a fixed five-axis radar projection.

pub mod config;
pub mod debrief;
pub mod error;
pub mod simulation;
pub mod telemetry;
