//! Job scheduling — determines when queued jobs are due.

use chrono::DateTime;

/// Returns true if `next_run_at` is in the past relative to `now`.
pub fn is_job_due(next_run_at: &str, now: &str) -> bool {
    let next = DateTime::parse_from_rfc3339(next_run_at).ok();
    let current = DateTime::parse_from_rfc3339(now).ok();
    match (next, current) {
        (Some(n), Some(c)) => n <= c,
        _ => false,
    }
}

/// Return the ISO-8601 timestamp for `now + interval_days`.
pub fn next_run_timestamp(interval_days: u32) -> String {
    use chrono::Utc;
    let next = Utc::now() + chrono::Duration::days(i64::from(interval_days));
    next.to_rfc3339()
}
