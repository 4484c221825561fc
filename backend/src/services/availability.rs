//! # Availability
//!
//! Interval arithmetic behind the reservation availability check.
//!
//! ## Overlap Rule
//!
//! Two windows `A = [a1, a2)` and `B = [b1, b2)` overlap iff
//! `a1 < b2 && b1 < a2`. Windows that merely touch do not overlap:
//!
//! ```text
//!   A  ├──────────┤
//!   B             ├──────────┤      touching: free
//!   C        ├─────────┤            partial:  conflict
//!   D     ├──┤                      nested:   conflict
//! ```
//!
//! [`conflict_filter`] expresses the rule as the single store query the
//! engine issues, with the stored reservation as `B`:
//! `start_time < window.end AND end_time > window.start`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::db::{Filter, ReservationStatus};

use super::ServiceError;

/// A validated `[start, end)` window with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted intervals.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ServiceError> {
        if start >= end {
            return Err(ServiceError::ValidationFailed(format!(
                "start_time {} must be before end_time {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the window in fractional hours.
    pub fn hours(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// Store filter selecting the reservations that block `window` on any of
/// `spot_ids`.
///
/// ## Arguments
///
/// * `spot_ids` - Spots being checked
/// * `window` - Requested window
/// * `ignore_canceled` - Only `valid` reservations block when set
/// * `exclude` - Reservation that never conflicts with itself (edit)
pub fn conflict_filter(
    spot_ids: &[String],
    window: &TimeWindow,
    ignore_canceled: bool,
    exclude: Option<&str>,
) -> Filter {
    let mut clauses = vec![
        Filter::is_in("spot_id", spot_ids),
        Filter::lt("start_time", window.end()),
        Filter::gt("end_time", window.start()),
    ];

    if ignore_canceled {
        clauses.push(Filter::eq("status", ReservationStatus::Valid.as_str()));
    }
    if let Some(reservation_id) = exclude {
        clauses.push(Filter::ne("reservation_id", reservation_id));
    }

    Filter::And(clauses)
}

/// Requested spots minus the unavailable ones.
///
/// Keeps the order of `requested`; a repeated id appears once, at its
/// first position.
pub fn remaining_spots<'a, I>(requested: &[String], unavailable: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let blocked: HashSet<&str> = unavailable.into_iter().collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(requested.len());

    requested
        .iter()
        .filter(|id| !blocked.contains(id.as_str()))
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeWindow {
        TimeWindow::new(start, end).unwrap()
    }

    #[test]
    fn test_window_rejects_empty_and_inverted() {
        assert!(matches!(
            TimeWindow::new(at(10, 0), at(10, 0)),
            Err(ServiceError::ValidationFailed(_))
        ));
        assert!(TimeWindow::new(at(11, 0), at(10, 0)).is_err());
    }

    /// Does a valid reservation on `s1` over `existing` block `requested`?
    fn blocks(existing: TimeWindow, requested: TimeWindow) -> bool {
        let stored = json!({
            "reservation_id": "r1",
            "spot_id": "s1",
            "start_time": existing.start().to_rfc3339(),
            "end_time": existing.end().to_rfc3339(),
            "status": "valid",
        });
        conflict_filter(&["s1".to_string()], &requested, false, None).matches(&stored)
    }

    #[test]
    fn test_overlap_cases() {
        let base = window(at(10, 0), at(11, 0));

        // touching on either side
        assert!(!blocks(base, window(at(11, 0), at(12, 0))));
        assert!(!blocks(base, window(at(9, 0), at(10, 0))));
        // partial
        assert!(blocks(base, window(at(10, 30), at(11, 30))));
        assert!(blocks(base, window(at(9, 30), at(10, 1))));
        // nested both ways
        assert!(blocks(base, window(at(10, 15), at(10, 45))));
        assert!(blocks(window(at(10, 15), at(10, 45)), base));
        // identical
        assert!(blocks(base, base));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let windows = [
            window(at(8, 0), at(9, 0)),
            window(at(8, 30), at(10, 0)),
            window(at(9, 0), at(9, 1)),
            window(at(7, 0), at(12, 0)),
        ];
        for a in windows {
            for b in windows {
                assert_eq!(blocks(a, b), blocks(b, a));
            }
        }
    }

    #[test]
    fn test_hours_fractional() {
        assert_eq!(window(at(10, 0), at(11, 30)).hours(), 1.5);
        let w = window(at(10, 0), at(10, 0) + Duration::milliseconds(900));
        assert!((w.hours() - 0.00025).abs() < 1e-12);
    }

    #[test]
    fn test_remaining_spots_preserves_order_and_dedupes() {
        let requested: Vec<String> = ["s3", "s1", "s2", "s1", "s3"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let free = remaining_spots(&requested, ["s2"]);
        assert_eq!(free, vec!["s3".to_string(), "s1".to_string()]);

        let none = remaining_spots(&requested, ["s1", "s2", "s3"]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_conflict_filter_matches_overlapping_reservation() {
        let requested = vec!["s1".to_string()];
        let w = window(at(10, 30), at(10, 45));
        let existing = json!({
            "reservation_id": "r1",
            "spot_id": "s1",
            "start_time": "2024-05-01T10:00:00Z",
            "end_time": "2024-05-01T11:00:00Z",
            "status": "canceled",
        });

        assert!(conflict_filter(&requested, &w, false, None).matches(&existing));
        assert!(!conflict_filter(&requested, &w, true, None).matches(&existing));
        assert!(!conflict_filter(&requested, &w, false, Some("r1")).matches(&existing));

        let touching = window(at(11, 0), at(12, 0));
        assert!(!conflict_filter(&requested, &touching, false, None).matches(&existing));
    }
}
