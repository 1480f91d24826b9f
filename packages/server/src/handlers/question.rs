use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::question;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::question::*;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/questions",
    tag = "Questions",
    operation_id = "listQuestions",
    summary = "List questions",
    responses(
        (status = 200, description = "All questions by ID", body = Vec<QuestionListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_questions(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionListItem>>, AppError> {
    let questions = question::Entity::find()
        .order_by_asc(question::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(questions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/questions/{id}",
    tag = "Questions",
    operation_id = "getQuestion",
    summary = "Get a question",
    params(("id" = i32, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question detail", body = QuestionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(question_id))]
pub async fn get_question(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<i32>,
) -> Result<Json<QuestionResponse>, AppError> {
    let question = question::Entity::find_by_id(question_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".into()))?;
    Ok(Json(question.into()))
}

#[utoipa::path(
    post,
    path = "/questions",
    tag = "Questions",
    operation_id = "createQuestion",
    summary = "Add a question",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = QuestionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Slug already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, slug = %payload.slug))]
pub async fn create_question(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_question(&payload)?;

    let tags: Vec<String> = payload.tags.iter().map(|t| t.trim().to_string()).collect();
    let new_question = question::ActiveModel {
        slug: Set(payload.slug),
        title: Set(payload.title.trim().to_string()),
        difficulty: Set(payload.difficulty),
        tags: Set(serde_json::json!(tags)),
        description: Set(payload.description),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_question
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("A question with this slug already exists".into())
            }
            _ => AppError::from(e),
        })?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from(model))))
}
