use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{question, submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::judge::JudgeRequest;
use crate::models::submission::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/submissions",
    tag = "Submissions",
    operation_id = "createSubmission",
    summary = "Run code and record the verdict",
    description = "Sends the source to the judge, waits for a final verdict, and stores it. Nothing is stored when the judge is unreachable.",
    request_body = CreateSubmissionRequest,
    responses(
        (status = 201, description = "Judged submission", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Judge unavailable (JUDGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, question_id = payload.question_id, language_id = payload.language_id))]
pub async fn create_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_submission(&payload)?;

    question::Entity::find_by_id(payload.question_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".into()))?;

    let verdict = state
        .judge
        .run(JudgeRequest {
            language_id: payload.language_id,
            source_code: payload.source_code.clone(),
            stdin: payload.stdin.clone(),
        })
        .await?;

    let new_submission = submission::ActiveModel {
        user_id: Set(auth_user.user_id),
        question_id: Set(payload.question_id),
        language_id: Set(payload.language_id),
        source_code: Set(payload.source_code),
        stdin: Set(payload.stdin),
        status: Set(verdict.status),
        execution_time: Set(verdict.execution_time_ms),
        memory_used: Set(verdict.memory_kb),
        stdout: Set(verdict.stdout),
        stderr: Set(verdict.stderr),
        compile_output: Set(verdict.compile_output),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_submission.insert(&state.db).await?;

    info!(submission_id = model.id, status = %model.status, "Submission judged");
    Ok((StatusCode::CREATED, Json(SubmissionResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/submissions",
    tag = "Submissions",
    operation_id = "listMySubmissions",
    summary = "List the caller's submissions",
    responses(
        (status = 200, description = "Submissions, newest first", body = Vec<SubmissionListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionListItem>>, AppError> {
    let submissions = submission::Entity::find()
        .filter(submission::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(submission::Column::CreatedAt)
        .order_by_desc(submission::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(submissions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/submissions/{id}",
    tag = "Submissions",
    operation_id = "getSubmission",
    summary = "Get one of the caller's submissions",
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission detail", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Owned by another user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(submission_id))]
pub async fn get_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(submission_id): Path<i32>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let submission = submission::Entity::find_by_id(submission_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    if submission.user_id != auth_user.user_id {
        return Err(AppError::PermissionDenied(
            "You can only view your own submissions".into(),
        ));
    }
    Ok(Json(submission.into()))
}
