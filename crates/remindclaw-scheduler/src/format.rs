//! Human-readable rendering of reminders and durations for listings.

use crate::clock::WEEKDAY_LETTERS;
use crate::reminder::Reminder;

/// Render a second count the way a person would say it: minutes only, then
/// hours and minutes, then days, hours and minutes. Seconds are dropped.
pub fn readable_time_delta(seconds: i64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let minutes_part = count(minutes, "minute");
    if days > 0 {
        format!("{}, {} and {}", count(days, "day"), count(hours, "hour"), minutes_part)
    } else if hours > 0 {
        format!("{} and {}", count(hours, "hour"), minutes_part)
    } else {
        minutes_part
    }
}

fn count(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// One listing line for a reminder.
pub fn describe(reminder: &Reminder) -> String {
    let mut line = format!(
        "[{}] At {}: '{}'",
        reminder.id,
        reminder.when.format("%m/%d/%y %H:%M UTC"),
        reminder.message
    );
    if let Some(days) = &reminder.repeat {
        line.push_str(&format!(" (Repeat every {})", repeat_letters(days)));
    }
    line
}

/// Map weekday codes back to their letters: `[0, 2, 4]` is `"M,W,F"`.
pub fn repeat_letters(days: &[u8]) -> String {
    days.iter()
        .filter_map(|&day| WEEKDAY_LETTERS.get(usize::from(day)))
        .map(|letter| letter.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_minutes_only() {
        assert_eq!(readable_time_delta(610), "10 minutes");
    }

    #[test]
    fn test_hours_and_minutes() {
        assert_eq!(readable_time_delta(3 * 3_600 + 610), "3 hours and 10 minutes");
    }

    #[test]
    fn test_days_hours_and_minutes() {
        assert_eq!(
            readable_time_delta(8 * 86_400 + 3 * 3_600 + 610),
            "8 days, 3 hours and 10 minutes"
        );
    }

    #[test]
    fn test_singular_forms() {
        assert_eq!(readable_time_delta(65), "1 minute");
        assert_eq!(readable_time_delta(3_600 + 65), "1 hour and 1 minute");
        assert_eq!(readable_time_delta(86_400 + 3_600 + 65), "1 day, 1 hour and 1 minute");
    }

    fn standup() -> Reminder {
        Reminder {
            id: "1234567890abcdef1234567890abcdef".into(),
            channel: "#bots".into(),
            message: "Standup Time!".into(),
            when: Utc.with_ymd_and_hms(2013, 12, 11, 13, 15, 0).unwrap(),
            repeat: None,
        }
    }

    #[test]
    fn test_describe_one_shot() {
        assert_eq!(
            describe(&standup()),
            "[1234567890abcdef1234567890abcdef] At 12/11/13 13:15 UTC: 'Standup Time!'"
        );
    }

    #[test]
    fn test_describe_with_repeat() {
        let mut rec = standup();
        rec.repeat = Some(vec![0, 2, 4]);
        assert_eq!(
            describe(&rec),
            "[1234567890abcdef1234567890abcdef] At 12/11/13 13:15 UTC: 'Standup Time!' (Repeat every M,W,F)"
        );
    }

    #[test]
    fn test_repeat_letters_full_week() {
        assert_eq!(repeat_letters(&[0, 1, 2, 3, 4, 5, 6]), "M,T,W,R,F,S,U");
    }
}
