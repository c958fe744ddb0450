use std::time::{Duration, Instant};

use andon_core::types::ListQuery;

/// Collapses refresh triggers that would repeat the same request. Two
/// attempts with the same filter window inside the dedupe window resolve to
/// one fetch; a changed window always fetches. Timing is keyed on request
/// start.
#[derive(Debug)]
pub struct FetchDeduper {
    window: Duration,
    last: Option<(ListQuery, Instant)>,
}

impl FetchDeduper {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Decide whether an attempt at `now` should go out. Forced attempts
    /// (the post-update refetch) bypass the window but still record
    /// themselves as the most recent fetch.
    pub fn should_fetch(&mut self, query: &ListQuery, forced: bool, now: Instant) -> bool {
        if !forced {
            if let Some((last_query, at)) = &self.last {
                if last_query == query && now.duration_since(*at) < self.window {
                    return false;
                }
            }
        }
        self.last = Some((query.clone(), now));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(status: &str) -> ListQuery {
        ListQuery::new(
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            status,
        )
    }

    #[test]
    fn test_repeat_within_window_skipped() {
        let mut deduper = FetchDeduper::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(deduper.should_fetch(&query("0"), false, t0));
        assert!(!deduper.should_fetch(&query("0"), false, t0 + Duration::from_secs(2)));
        assert!(!deduper.should_fetch(&query("0"), false, t0 + Duration::from_secs(4)));
    }

    #[test]
    fn test_window_expiry_allows_fetch() {
        let mut deduper = FetchDeduper::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(deduper.should_fetch(&query("0"), false, t0));
        assert!(deduper.should_fetch(&query("0"), false, t0 + Duration::from_secs(5)));
    }

    #[test]
    fn test_changed_query_always_fetches() {
        let mut deduper = FetchDeduper::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(deduper.should_fetch(&query("0"), false, t0));

        let mut narrowed = query("0");
        narrowed.end_date = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert!(deduper.should_fetch(&narrowed, false, t0 + Duration::from_secs(1)));
    }

    #[test]
    fn test_forced_attempt_bypasses_window() {
        let mut deduper = FetchDeduper::new(Duration::from_secs(5));
        let t0 = Instant::now();
        assert!(deduper.should_fetch(&query("0"), false, t0));
        assert!(deduper.should_fetch(&query("0"), true, t0 + Duration::from_secs(1)));
        // the forced fetch restarts the window
        assert!(!deduper.should_fetch(&query("0"), false, t0 + Duration::from_secs(3)));
    }
}
