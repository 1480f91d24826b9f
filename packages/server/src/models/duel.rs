use chrono::{DateTime, Utc};
use common::{DuelConfig, DuelStatus, Outcome, ParticipantStatus};
use serde::{Deserialize, Serialize};

use crate::duel::NewDuel;
use crate::error::AppError;

use super::question::QuestionSummary;
use super::shared::{UserSummary, validate_title};

/// Request body for creating a duel.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateDuelRequest {
    /// Duel title (1-256 characters).
    #[schema(example = "Friday warm-up")]
    pub title: String,
    /// Question both participants solve.
    #[schema(example = 1)]
    pub question_id: i32,
    /// Minutes allowed once the duel starts. Defaults to 30.
    #[schema(example = 30)]
    pub time_limit: Option<i32>,
    /// Whether the duel appears in the public listing. Defaults to true.
    #[schema(example = true)]
    pub is_public: Option<bool>,
}

pub fn validate_create_duel(
    req: &CreateDuelRequest,
    config: &DuelConfig,
) -> Result<NewDuel, AppError> {
    validate_title(&req.title)?;

    let time_limit = req.time_limit.unwrap_or(config.default_time_limit);
    if time_limit < config.min_time_limit || time_limit > config.max_time_limit {
        return Err(AppError::Validation(format!(
            "Time limit must be between {} and {} minutes",
            config.min_time_limit, config.max_time_limit
        )));
    }

    Ok(NewDuel {
        title: req.title.trim().to_string(),
        question_id: req.question_id,
        time_limit,
        is_public: req.is_public.unwrap_or(true),
    })
}

/// Request body for submitting a judged solution to a duel.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitSolutionRequest {
    /// ID of a finished submission owned by the caller for the duel's question.
    #[schema(example = 17)]
    pub submission_id: i32,
}

/// One participant slot of a duel.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipantResponse {
    pub user: UserSummary,
    /// 1 for the creator, 2 for the opponent.
    #[schema(example = 1)]
    pub slot: i32,
    pub joined_at: DateTime<Utc>,
    pub submission_id: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: ParticipantStatus,
    /// Milliseconds.
    #[schema(example = 42)]
    pub execution_time: Option<i32>,
    /// Kilobytes.
    #[schema(example = 3248)]
    pub memory_used: Option<i32>,
}

/// A duel with its creator, opponent, question and participants resolved.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DuelResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Friday warm-up")]
    pub title: String,
    pub status: DuelStatus,
    pub created_by: UserSummary,
    pub opponent: Option<UserSummary>,
    pub question: QuestionSummary,
    /// Minutes.
    #[schema(example = 30)]
    pub time_limit: i32,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_public: bool,
    /// Present only for the creator and participants.
    #[schema(example = "K7QM2XPA")]
    pub invite_code: Option<String>,
    pub participants: Vec<ParticipantResponse>,
    /// User credited with the win once the duel is completed.
    #[schema(example = 42)]
    pub winner_id: Option<i32>,
    /// The duel's outcome from the requesting user's side, if they take part.
    pub outcome: Option<Outcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response for a successful cancellation.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CancelDuelResponse {
    #[schema(example = "Duel cancelled successfully")]
    pub message: String,
    pub duel: DuelResponse,
}
