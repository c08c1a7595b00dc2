//! Workout history views: most recent sessions and the consistency matrix

use chrono::{Days, FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::WorkoutLog;

/// Ten weeks, one cell per day
pub const ACTIVITY_DAYS: u32 = 70;

/// Longest window the matrix will cover
pub const MAX_ACTIVITY_DAYS: u32 = 3650;

/// Sessions finished on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub count: usize,
}

/// Up to `limit` logs, most recently finished first. Logs without an end time sort last.
pub fn recent_logs(logs: &[WorkoutLog], limit: usize) -> Vec<&WorkoutLog> {
    let mut sorted: Vec<&WorkoutLog> = logs.iter().collect();
    sorted.sort_by(|a, b| b.end_time.cmp(&a.end_time));
    sorted.truncate(limit);
    sorted
}

/// Per-day session counts for the `days` days ending at `today`, oldest first.
///
/// A log counts on the local calendar day (under `offset`) of its end time.
/// `days` is capped at [`MAX_ACTIVITY_DAYS`] and the window stops at the
/// earliest representable date.
pub fn activity_matrix(logs: &[WorkoutLog], today: NaiveDate, days: u32, offset: FixedOffset) -> Vec<ActivityDay> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for end in logs.iter().filter_map(|log| log.end_time) {
        *counts.entry(end.with_timezone(&offset).date_naive()).or_default() += 1;
    }

    (0..days.min(MAX_ACTIVITY_DAYS))
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .map(|date| ActivityDay {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}
