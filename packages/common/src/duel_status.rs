#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a duel.
///
/// Transitions only move forward: `Pending -> Active -> Completed`, or `Pending -> Cancelled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum DuelStatus {
    /// Waiting for an opponent.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    /// Both participants joined; the time window is running.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "active"))]
    Active,
    /// Every participant finished, or the window was closed by the server.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "completed"))]
    Completed,
    /// Withdrawn by the creator before anyone joined.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "cancelled"))]
    Cancelled,
}

impl DuelStatus {
    pub const ALL: &'static [DuelStatus] = &[
        Self::Pending,
        Self::Active,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: DuelStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Cancelled)
                | (Self::Active, Self::Completed)
        )
    }

    /// Pending and active duels are shown in the public lobby.
    pub fn is_listed(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DuelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for DuelStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl FromStr for DuelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DuelStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid duel status '{s}'"))
    }
}

/// Result recorded on a participant's slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    /// No solution recorded yet.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    /// Solution was accepted by the judge.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "success"))]
    Success,
    /// Solution was judged and rejected.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "failed"))]
    Failed,
    /// No solution arrived before the duel's end time.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "timeout"))]
    Timeout,
}

impl ParticipantStatus {
    /// Derive a participant result from a judge verdict.
    pub fn from_verdict(accepted: bool) -> Self {
        if accepted { Self::Success } else { Self::Failed }
    }

    /// A solution counts only when it was judged inside the time window.
    pub fn is_in_time_submission(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ParticipantStatus {
    fn default() -> Self {
        Self::Pending
    }
}
