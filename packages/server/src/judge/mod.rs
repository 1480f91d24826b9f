//! Code execution behind an object-safe seam.
//!
//! Handlers only see `Arc<dyn Judge>`; production wires in [`Judge0Client`],
//! tests substitute their own implementation.

pub mod judge0;

use std::time::Duration;

use async_trait::async_trait;
use common::SubmissionStatus;
use thiserror::Error;

pub use judge0::Judge0Client;

/// One program run.
#[derive(Debug, Clone)]
pub struct JudgeRequest {
    pub language_id: i32,
    pub source_code: String,
    pub stdin: Option<String>,
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeVerdict {
    pub status: SubmissionStatus,
    pub execution_time_ms: Option<i32>,
    pub memory_kb: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge is disabled")]
    Disabled,
    #[error("judge request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("judge rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("judge response did not include a submission token")]
    MissingToken,
    #[error("no final verdict after {0} polls")]
    Exhausted(u8),
    #[error("no final verdict within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Judge: Send + Sync {
    /// Run the program to completion and return a final verdict.
    async fn run(&self, request: JudgeRequest) -> Result<JudgeVerdict, JudgeError>;
}

/// Used when `judge.enabled = false`; every run fails.
pub struct DisabledJudge;

#[async_trait]
impl Judge for DisabledJudge {
    async fn run(&self, _request: JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        Err(JudgeError::Disabled)
    }
}
