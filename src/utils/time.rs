use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Exponential retry delay for failed outbox events, capped at one hour.
pub fn retry_backoff_secs(attempts: i32) -> i64 {
    let exponent = (attempts - 1).clamp(0, 16) as u32;
    (30_i64 * 2_i64.pow(exponent)).min(3600)
}
