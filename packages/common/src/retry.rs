use std::time::Duration;

use rand::Rng;

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(base_ms * 2^(attempt-1) + jitter, max_ms)` (0-25% jitter)
pub fn calculate_backoff(attempt: u8, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    let total_delay = delay_ms.saturating_add(jitter).min(max_ms);
    Duration::from_millis(total_delay)
}

/// Polling schedule for a remote job: a bounded number of backoff-spaced attempts.
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    pub max_attempts: u8,
    pub base_ms: u64,
    pub max_ms: u64,
}

impl PollSchedule {
    /// Delay to wait before poll number `attempt` (1-based).
    pub fn delay_before(&self, attempt: u8) -> Duration {
        calculate_backoff(attempt, self.base_ms, self.max_ms)
    }

    /// Upper bound of the time spent sleeping across every attempt, jitter excluded.
    pub fn worst_case(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|attempt| {
                let exp = 2u64.saturating_pow((attempt - 1) as u32);
                Duration::from_millis(self.base_ms.saturating_mul(exp).min(self.max_ms))
            })
            .sum()
    }
}
