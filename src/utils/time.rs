use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch; 0 if the clock is set before it
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

/// Seconds elapsed since `start`, clamped at zero when the clock went backwards
pub fn seconds_since(start: i64, now: i64) -> i64 {
    (now - start).max(0)
}
