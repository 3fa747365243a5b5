//! Identifier and timestamp generation

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Generate a new random note identifier
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate an identifier that `is_taken` does not report as already in use
pub fn fresh_id<F>(is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    loop {
        let id = generate_id();
        if !is_taken(&id) {
            return id;
        }
        tracing::debug!("Regenerating colliding note id {}", id);
    }
}

/// Current UTC time as an ISO-8601 string with millisecond precision
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_not_empty() {
        assert!(!generate_id().is_empty());
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_fresh_id_retries_on_collision() {
        let calls = Cell::new(0);
        let id = fresh_id(|_| {
            calls.set(calls.get() + 1);
            calls.get() < 3
        });

        assert!(!id.is_empty());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_current_timestamp_format() {
        let ts = current_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        // 2025-01-15T10:00:00.000Z
        assert_eq!(ts.len(), 24);
    }
}
