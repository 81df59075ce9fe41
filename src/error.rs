//! Errors surfaced by the ranking pipeline.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankerError {
    /// Every task in a batch failed or returned no usable entrants.
    #[error("nothing retrieved: all {attempted} event fetches failed or returned no entrants")]
    NothingRetrieved { attempted: usize },

    /// A single retrieval exceeded its deadline.
    #[error("fetch for {event_key} timed out after {after:?}")]
    Timeout { event_key: String, after: Duration },

    /// An event had no entrant with a usable identity.
    #[error("event {event_key} has no valid entrants")]
    EmptyEvent { event_key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_retrieved_mentions_count() {
        let err = RankerError::NothingRetrieved { attempted: 5 };
        assert!(err.to_string().contains("all 5"));
    }

    #[test]
    fn test_timeout_displays_event_and_duration() {
        let err = RankerError::Timeout {
            event_key: "ascot-14-30".to_string(),
            after: Duration::from_secs(20),
        };
        let msg = err.to_string();
        assert!(msg.contains("ascot-14-30"));
        assert!(msg.contains("20s"));
    }

    #[test]
    fn test_empty_event_names_event() {
        let err = RankerError::EmptyEvent {
            event_key: "ayr-2026-03-10".to_string(),
        };
        assert_eq!(err.to_string(), "event ayr-2026-03-10 has no valid entrants");
    }
}
