pub mod config;
pub mod duel_status;
pub mod outcome;
pub mod retry;
pub mod submission_status;

pub use config::{DuelConfig, JudgeConfig};
pub use duel_status::{DuelStatus, ParticipantStatus};
pub use outcome::{Outcome, ParticipantSnapshot, compute_outcome, winner};
pub use submission_status::SubmissionStatus;
