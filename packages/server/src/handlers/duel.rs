use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::duel::view::{hydrate, hydrate_loaded, hydrate_one};
use crate::duel::{DuelRef, DuelService, DuelStats};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::duel::*;
use crate::state::AppState;

fn service(state: &AppState) -> DuelService<'_, sea_orm::DatabaseConnection> {
    DuelService::new(&state.db, &state.config.duel)
}

#[utoipa::path(
    post,
    path = "/duels",
    tag = "Duels",
    operation_id = "createDuel",
    summary = "Create a duel",
    description = "Creates a pending duel with the caller as its first participant. The response carries the invite code.",
    request_body = CreateDuelRequest,
    responses(
        (status = 201, description = "Duel created", body = DuelResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Question not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, question_id = payload.question_id))]
pub async fn create_duel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateDuelRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_duel = validate_create_duel(&payload, &state.config.duel)?;
    let duel = service(&state).create(new_duel, auth_user.user_id).await?;
    let body = hydrate_one(&state.db, duel, auth_user.user_id).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    get,
    path = "/duels/public",
    tag = "Duels",
    operation_id = "listPublicDuels",
    summary = "List open public duels",
    description = "Public duels that are pending or active, newest first.",
    responses(
        (status = 200, description = "Public duels", body = Vec<DuelResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_public_duels(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DuelResponse>>, AppError> {
    let duels = service(&state).list_public().await?;
    Ok(Json(hydrate(&state.db, duels, auth_user.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/duels/user/me",
    tag = "Duels",
    operation_id = "listMyDuels",
    summary = "List the caller's duels",
    responses(
        (status = 200, description = "Duels the caller takes part in, newest first", body = Vec<DuelResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_my_duels(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DuelResponse>>, AppError> {
    let duels = service(&state).list_for_user(auth_user.user_id).await?;
    Ok(Json(hydrate(&state.db, duels, auth_user.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/duels/user/me/stats",
    tag = "Duels",
    operation_id = "getMyDuelStats",
    summary = "Win/loss counters for the caller",
    responses(
        (status = 200, description = "Outcome counters", body = DuelStats),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_my_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DuelStats>, AppError> {
    Ok(Json(service(&state).stats_for_user(auth_user.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/duels/{id}",
    tag = "Duels",
    operation_id = "getDuel",
    summary = "Get a duel",
    params(("id" = i32, Path, description = "Duel ID")),
    responses(
        (status = 200, description = "Duel", body = DuelResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Private duel (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Duel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(duel_id))]
pub async fn get_duel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(duel_id): Path<i32>,
) -> Result<Json<DuelResponse>, AppError> {
    let found = service(&state)
        .find(DuelRef::Id(duel_id), auth_user.user_id)
        .await?;
    single(&state, found, auth_user.user_id).await
}

#[utoipa::path(
    get,
    path = "/duels/invite/{invite_code}",
    tag = "Duels",
    operation_id = "getDuelByInvite",
    summary = "Get a duel by invite code",
    params(("invite_code" = String, Path, description = "Invite code")),
    responses(
        (status = 200, description = "Duel", body = DuelResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Private duel (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Duel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, invite_code))]
pub async fn get_duel_by_invite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(invite_code): Path<String>,
) -> Result<Json<DuelResponse>, AppError> {
    let found = service(&state)
        .find(DuelRef::InviteCode(&invite_code), auth_user.user_id)
        .await?;
    single(&state, found, auth_user.user_id).await
}

async fn single(
    state: &AppState,
    found: crate::duel::DuelWithParticipants,
    viewer_id: i32,
) -> Result<Json<DuelResponse>, AppError> {
    hydrate_loaded(&state.db, vec![found], viewer_id)
        .await?
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("hydration returned no duel".into()))
}

#[utoipa::path(
    post,
    path = "/duels/{id}/join",
    tag = "Duels",
    operation_id = "joinDuel",
    summary = "Join a pending duel",
    description = "Adds the caller as the second participant. The duel becomes active and its clock starts.",
    params(("id" = i32, Path, description = "Duel ID")),
    responses(
        (status = 200, description = "Joined", body = DuelResponse),
        (status = 400, description = "Not joinable (INVALID_STATE, ALREADY_JOINED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Duel not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Concurrent modification (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(duel_id, user_id = auth_user.user_id))]
pub async fn join_duel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(duel_id): Path<i32>,
) -> Result<Json<DuelResponse>, AppError> {
    let duel = service(&state)
        .join(DuelRef::Id(duel_id), auth_user.user_id)
        .await?;
    Ok(Json(hydrate_one(&state.db, duel, auth_user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/duels/invite/{invite_code}",
    tag = "Duels",
    operation_id = "joinDuelByInvite",
    summary = "Join a duel by invite code",
    description = "Same rules as a direct join. Works for private duels.",
    params(("invite_code" = String, Path, description = "Invite code")),
    responses(
        (status = 200, description = "Joined", body = DuelResponse),
        (status = 400, description = "Not joinable (INVALID_STATE, ALREADY_JOINED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Duel not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Concurrent modification (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, invite_code), fields(user_id = auth_user.user_id))]
pub async fn join_duel_by_invite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(invite_code): Path<String>,
) -> Result<Json<DuelResponse>, AppError> {
    let duel = service(&state)
        .join(DuelRef::InviteCode(&invite_code), auth_user.user_id)
        .await?;
    Ok(Json(hydrate_one(&state.db, duel, auth_user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/duels/{id}/submit",
    tag = "Duels",
    operation_id = "submitDuelSolution",
    summary = "Submit a judged solution",
    description = "Records one of the caller's finished submissions for the duel's question. The duel completes once both participants have submitted.",
    params(("id" = i32, Path, description = "Duel ID")),
    request_body = SubmitSolutionRequest,
    responses(
        (status = 200, description = "Submission recorded", body = DuelResponse),
        (status = 400, description = "Duel not active or submission unusable (INVALID_STATE, VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not a participant or not the submission owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Duel or submission not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already submitted (ALREADY_SUBMITTED) or concurrent modification (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(duel_id, user_id = auth_user.user_id, submission_id = payload.submission_id))]
pub async fn submit_solution(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(duel_id): Path<i32>,
    AppJson(payload): AppJson<SubmitSolutionRequest>,
) -> Result<Json<DuelResponse>, AppError> {
    let duel = service(&state)
        .submit(duel_id, auth_user.user_id, payload.submission_id)
        .await?;
    Ok(Json(hydrate_one(&state.db, duel, auth_user.user_id).await?))
}

#[utoipa::path(
    put,
    path = "/duels/{id}/cancel",
    tag = "Duels",
    operation_id = "cancelDuel",
    summary = "Cancel a pending duel",
    description = "Only the creator may cancel, and only while the duel is pending.",
    params(("id" = i32, Path, description = "Duel ID")),
    responses(
        (status = 200, description = "Cancelled", body = CancelDuelResponse),
        (status = 400, description = "Duel not pending (INVALID_STATE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the creator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Duel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(duel_id, user_id = auth_user.user_id))]
pub async fn cancel_duel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(duel_id): Path<i32>,
) -> Result<Json<CancelDuelResponse>, AppError> {
    let duel = service(&state).cancel(duel_id, auth_user.user_id).await?;
    Ok(Json(CancelDuelResponse {
        message: "Duel cancelled successfully".into(),
        duel: hydrate_one(&state.db, duel, auth_user.user_id).await?,
    }))
}
