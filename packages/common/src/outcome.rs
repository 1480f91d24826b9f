//! Winner determination for duels.
//!
//! Outcomes are always derived from the participant slots of a duel and never stored.

use serde::Serialize;

use crate::duel_status::{DuelStatus, ParticipantStatus};

/// How a duel ended from one participant's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The duel has not finished yet.
    Pending,
    Win,
    Loss,
    /// Nobody is credited: equal runtimes, both failed, or neither submitted.
    Draw,
}

/// The parts of a participant slot that decide a duel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParticipantSnapshot {
    pub user_id: i32,
    pub result: ParticipantStatus,
    /// Milliseconds reported by the judge.
    pub execution_time: Option<i32>,
}

impl ParticipantSnapshot {
    fn submitted(&self) -> bool {
        self.result.is_in_time_submission()
    }

    fn succeeded(&self) -> bool {
        self.result == ParticipantStatus::Success
    }
}

/// Compute the outcome of a duel for `user_id`.
///
/// Returns `None` when the user never took part or the duel was cancelled.
pub fn compute_outcome(
    status: DuelStatus,
    participants: &[ParticipantSnapshot],
    user_id: i32,
) -> Option<Outcome> {
    let me = participants.iter().find(|p| p.user_id == user_id)?;

    match status {
        DuelStatus::Cancelled => return None,
        DuelStatus::Pending | DuelStatus::Active => return Some(Outcome::Pending),
        DuelStatus::Completed => {}
    }

    let Some(other) = participants.iter().find(|p| p.user_id != user_id) else {
        return Some(Outcome::Draw);
    };

    let outcome = match (me.submitted(), other.submitted()) {
        (true, false) => Outcome::Win,
        (false, true) => Outcome::Loss,
        (false, false) => Outcome::Draw,
        (true, true) => match (me.succeeded(), other.succeeded()) {
            (true, false) => Outcome::Win,
            (false, true) => Outcome::Loss,
            (false, false) => Outcome::Draw,
            (true, true) => match (me.execution_time, other.execution_time) {
                (Some(mine), Some(theirs)) if mine < theirs => Outcome::Win,
                (Some(mine), Some(theirs)) if mine > theirs => Outcome::Loss,
                _ => Outcome::Draw,
            },
        },
    };

    Some(outcome)
}

/// The participant credited with the win, if any.
pub fn winner(status: DuelStatus, participants: &[ParticipantSnapshot]) -> Option<i32> {
    participants
        .iter()
        .find(|p| compute_outcome(status, participants, p.user_id) == Some(Outcome::Win))
        .map(|p| p.user_id)
}
