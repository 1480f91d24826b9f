use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

use crate::duel::DuelError;
use crate::judge::JudgeError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `CONFLICT`, `USERNAME_TAKEN`, `INVALID_STATE`, `ALREADY_JOINED`,
    /// `ALREADY_SUBMITTED`, `JUDGE_UNAVAILABLE`, `INTERNAL_ERROR`.
    #[schema(example = "INVALID_STATE")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "This duel is no longer accepting participants")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied(String),
    NotFound(String),
    Conflict(String),
    UsernameTaken,
    /// The operation is not valid for the duel's current status.
    InvalidState(String),
    AlreadyJoined,
    AlreadySubmitted,
    JudgeUnavailable(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::PermissionDenied(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "Username is already taken".into(),
                },
            ),
            AppError::InvalidState(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INVALID_STATE",
                    message: msg,
                },
            ),
            AppError::AlreadyJoined => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "ALREADY_JOINED",
                    message: "You are already a participant in this duel".into(),
                },
            ),
            AppError::AlreadySubmitted => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ALREADY_SUBMITTED",
                    message: "You have already submitted a solution for this duel".into(),
                },
            ),
            AppError::JudgeUnavailable(detail) => {
                tracing::warn!("Judge unavailable: {}", detail);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody {
                        code: "JUDGE_UNAVAILABLE",
                        message: "The code execution service is unavailable".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<DuelError> for AppError {
    fn from(err: DuelError) -> Self {
        match err {
            DuelError::NotFound(msg) => AppError::NotFound(msg.into()),
            DuelError::InvalidState(msg) => AppError::InvalidState(msg.into()),
            DuelError::Forbidden(msg) => AppError::PermissionDenied(msg.into()),
            DuelError::AlreadyJoined => AppError::AlreadyJoined,
            DuelError::AlreadySubmitted => AppError::AlreadySubmitted,
            DuelError::Validation(msg) => AppError::Validation(msg),
            DuelError::Contended => {
                tracing::warn!("Duel write abandoned after repeated contention");
                AppError::Conflict("The duel was modified concurrently, please retry".into())
            }
            DuelError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<JudgeError> for AppError {
    fn from(err: JudgeError) -> Self {
        AppError::JudgeUnavailable(err.to_string())
    }
}
