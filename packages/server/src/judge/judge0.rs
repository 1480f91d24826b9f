use std::time::Duration;

use async_trait::async_trait;
use common::retry::PollSchedule;
use common::{JudgeConfig, SubmissionStatus};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{Judge, JudgeError, JudgeRequest, JudgeVerdict};

/// HTTP client for a Judge0-compatible API (self-hosted or RapidAPI).
pub struct Judge0Client {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    api_host: Option<String>,
    schedule: PollSchedule,
    deadline: Duration,
}

#[derive(Serialize)]
struct CreateSubmission<'a> {
    language_id: i32,
    source_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreatedSubmission {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    id: i32,
}

#[derive(Debug, Deserialize)]
struct WireSubmission {
    status: WireStatus,
    /// Seconds, as a decimal string.
    time: Option<String>,
    /// Kilobytes.
    memory: Option<i32>,
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
}

impl WireSubmission {
    fn into_verdict(self) -> JudgeVerdict {
        JudgeVerdict {
            status: SubmissionStatus::from_judge0_id(self.status.id),
            execution_time_ms: parse_time_ms(self.time.as_deref()),
            memory_kb: self.memory,
            stdout: self.stdout,
            stderr: self.stderr,
            compile_output: self.compile_output,
        }
    }
}

/// Convert Judge0's `"0.042"` seconds into milliseconds.
fn parse_time_ms(time: Option<&str>) -> Option<i32> {
    let secs: f64 = time?.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some((secs * 1000.0).round() as i32)
}

/// The configured deadline, but never shorter than a full poll schedule plus one request.
fn overall_deadline(
    configured: Duration,
    schedule: &PollSchedule,
    request_timeout: Duration,
) -> Duration {
    let floor = schedule.worst_case() + request_timeout;
    if configured < floor {
        warn!(
            configured = ?configured,
            raised_to = ?floor,
            "judge.timeout_secs is shorter than the poll schedule; raising it"
        );
        return floor;
    }
    configured
}

impl Judge0Client {
    pub fn new(config: &JudgeConfig) -> Result<Self, JudgeError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let http = Client::builder().timeout(request_timeout).build()?;

        let schedule = PollSchedule {
            max_attempts: config.poll_attempts,
            base_ms: config.poll_base_ms,
            max_ms: config.poll_max_ms,
        };
        let deadline = overall_deadline(
            Duration::from_secs(config.timeout_secs),
            &schedule,
            request_timeout,
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_host: config.api_host.clone(),
            schedule,
            deadline,
        })
    }

    fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = match &self.api_key {
            Some(key) => builder.header("X-RapidAPI-Key", key),
            None => builder,
        };
        match &self.api_host {
            Some(host) => builder.header("X-RapidAPI-Host", host),
            None => builder,
        }
    }

    async fn create(&self, request: &JudgeRequest) -> Result<String, JudgeError> {
        let url = format!(
            "{}/submissions?base64_encoded=false&wait=false",
            self.base_url
        );
        let body = CreateSubmission {
            language_id: request.language_id,
            source_code: &request.source_code,
            stdin: request.stdin.as_deref(),
        };

        let response = self
            .with_headers(self.http.post(url))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<CreatedSubmission>()
            .await?
            .token
            .ok_or(JudgeError::MissingToken)
    }

    async fn fetch(&self, token: &str) -> Result<WireSubmission, JudgeError> {
        let url = format!("{}/submissions/{}?base64_encoded=false", self.base_url, token);
        let response = self.with_headers(self.http.get(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<WireSubmission>().await?)
    }

    async fn run_to_completion(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        let token = self.create(request).await?;
        debug!(token = %token, "Judge0 submission created");

        for attempt in 1..=self.schedule.max_attempts {
            tokio::time::sleep(self.schedule.delay_before(attempt)).await;

            let result = self.fetch(&token).await?;
            let verdict = result.into_verdict();
            if verdict.status.is_final() {
                debug!(token = %token, attempt, status = %verdict.status, "Judge0 verdict");
                return Ok(verdict);
            }
        }

        Err(JudgeError::Exhausted(self.schedule.max_attempts))
    }
}

#[async_trait]
impl Judge for Judge0Client {
    #[instrument(skip(self, request), fields(language_id = request.language_id))]
    async fn run(&self, request: JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        match tokio::time::timeout(self.deadline, self.run_to_completion(&request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(deadline = ?self.deadline, "Judge0 run exceeded deadline");
                Err(JudgeError::Timeout(self.deadline))
            }
        }
    }
}
