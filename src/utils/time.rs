use chrono::Utc;

/// Seconds since the Unix epoch
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// A deadline counts as passed once `now` reaches it
pub fn has_expired(expires_at: i64, now: i64) -> bool {
    now >= expires_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_timestamp() {
        let ts = current_timestamp();
        // Should be a reasonable timestamp (after 2020-01-01)
        assert!(ts > 1577836800);
        // Should be before 2100-01-01
        assert!(ts < 4102444800);
    }

    #[test]
    fn test_has_expired() {
        assert!(!has_expired(1000, 999));
        // Edge case: exactly at the deadline
        assert!(has_expired(1000, 1000));
        assert!(has_expired(1000, 1500));
    }
}
