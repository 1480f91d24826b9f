use chrono::{DateTime, Utc};
use common::SubmissionStatus;
use serde::{Deserialize, Serialize};

use crate::entity::submission;
use crate::error::AppError;

/// Maximum source code size in bytes.
pub const MAX_SOURCE_SIZE: usize = 65_536;

/// Request body for creating a submission.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSubmissionRequest {
    #[schema(example = 1)]
    pub question_id: i32,
    /// Judge0 language id (e.g. 71 for Python 3, 54 for C++).
    #[schema(example = 71)]
    pub language_id: i32,
    #[schema(example = "print(input())")]
    pub source_code: String,
    /// Optional standard input for the run.
    pub stdin: Option<String>,
}

pub fn validate_create_submission(req: &CreateSubmissionRequest) -> Result<(), AppError> {
    if req.language_id <= 0 {
        return Err(AppError::Validation("language_id must be positive".into()));
    }
    if req.source_code.trim().is_empty() {
        return Err(AppError::Validation("Source code cannot be empty".into()));
    }
    if req.source_code.len() > MAX_SOURCE_SIZE {
        return Err(AppError::Validation(format!(
            "Source code ({} bytes) exceeds maximum ({} bytes)",
            req.source_code.len(),
            MAX_SOURCE_SIZE
        )));
    }
    if req.stdin.as_ref().is_some_and(|s| s.len() > MAX_SOURCE_SIZE) {
        return Err(AppError::Validation("stdin is too large".into()));
    }
    Ok(())
}

/// Full submission details.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub user_id: i32,
    #[schema(example = 1)]
    pub question_id: i32,
    #[schema(example = 71)]
    pub language_id: i32,
    pub source_code: String,
    pub stdin: Option<String>,
    pub status: SubmissionStatus,
    /// Milliseconds.
    #[schema(example = 42)]
    pub execution_time: Option<i32>,
    /// Kilobytes.
    #[schema(example = 3248)]
    pub memory_used: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    #[schema(example = "2025-10-01T14:30:00Z")]
    pub created_at: DateTime<Utc>,
}

impl From<submission::Model> for SubmissionResponse {
    fn from(m: submission::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            question_id: m.question_id,
            language_id: m.language_id,
            source_code: m.source_code,
            stdin: m.stdin,
            status: m.status,
            execution_time: m.execution_time,
            memory_used: m.memory_used,
            stdout: m.stdout,
            stderr: m.stderr,
            compile_output: m.compile_output,
            created_at: m.created_at,
        }
    }
}

/// Submission summary for list views (source and output omitted).
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionListItem {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub question_id: i32,
    #[schema(example = 71)]
    pub language_id: i32,
    pub status: SubmissionStatus,
    pub execution_time: Option<i32>,
    pub memory_used: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<submission::Model> for SubmissionListItem {
    fn from(m: submission::Model) -> Self {
        Self {
            id: m.id,
            question_id: m.question_id,
            language_id: m.language_id,
            status: m.status,
            execution_time: m.execution_time,
            memory_used: m.memory_used,
            created_at: m.created_at,
        }
    }
}
