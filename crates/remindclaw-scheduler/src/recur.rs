//! Weekly recurrence — computes when a repeating reminder fires next.

use chrono::{DateTime, Datelike, Duration, Utc};

/// Given the occurrence that just fired (or was stored) and the recurrence
/// weekday set (Monday=0 .. Sunday=6, ascending), compute the next occurrence
/// and the day offset to it. The scan always advances strictly past the
/// current weekday: a reminder firing on a Wednesday with Wednesday in its
/// set comes back in seven days, never the same day. Days remaining in the
/// current week win over wrapping to the next one.
///
/// Returns `None` when the set yields no candidate (empty set), which stops
/// the recurrence.
pub fn next_occurrence(when: DateTime<Utc>, repeat: &[u8]) -> Option<(DateTime<Utc>, i64)> {
    let current = when.weekday().num_days_from_monday() as u8;
    let day_delta = match repeat.iter().copied().find(|&day| day > current) {
        Some(day) => i64::from(day - current),
        None => 7 - i64::from(current) + i64::from(*repeat.iter().min()?),
    };
    Some((when + Duration::days(day_delta), day_delta))
}

/// Roll `when` forward, day by day, until it lands on a weekday in the set.
/// Unlike [`next_occurrence`] this accepts the current day, so a repeating
/// reminder created on one of its own weekdays keeps its first occurrence.
/// Used at creation time to align the first firing with the recurrence.
pub fn align_to_weekdays(when: DateTime<Utc>, repeat: &[u8]) -> DateTime<Utc> {
    (0..7)
        .map(|offset| when + Duration::days(offset))
        .find(|candidate| repeat.contains(&(candidate.weekday().num_days_from_monday() as u8)))
        .unwrap_or(when)
}
