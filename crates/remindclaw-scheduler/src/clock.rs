//! Time resolution — turns user tokens into concrete UTC instants.
//! Relative offsets ("20m", "2h", "1d"), 24-hour wall-clock times with an
//! optional IANA timezone, and weekday-letter recurrence sets.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use remindclaw_core::error::{RemindClawError, Result};

/// Weekday-letter alphabet, Monday through Sunday. R is Thursday and U is
/// Sunday so that every letter is distinct.
pub const WEEKDAY_LETTERS: [char; 7] = ['M', 'T', 'W', 'R', 'F', 'S', 'U'];

/// Parse a relative duration token: an integer immediately followed by one
/// unit character, `m`inutes, `h`ours, or `d`ays. Returns seconds.
pub fn parse_relative(token: &str) -> Result<i64> {
    let mut chars = token.chars();
    let unit = chars.next_back().ok_or_else(|| bad_duration(token))?;
    let n: i64 = match chars.as_str().parse() {
        Ok(n) if n > 0 => n,
        _ => return Err(bad_duration(token)),
    };
    let unit_secs = match unit {
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        _ => return Err(bad_duration(token)),
    };
    n.checked_mul(unit_secs).ok_or_else(|| bad_duration(token))
}

/// Parse an absolute time token (`HH:MM`, 24-hour) plus an optional timezone
/// name. Without a timezone the configured home timezone applies.
pub fn parse_absolute(time_token: &str, tz_token: Option<&str>, home: Tz) -> Result<(u32, u32, Tz)> {
    let (h, m) = time_token.split_once(':').ok_or_else(|| bad_time(time_token))?;
    let hour: u32 = h.parse().map_err(|_| bad_time(time_token))?;
    let minute: u32 = m.parse().map_err(|_| bad_time(time_token))?;
    if hour > 23 || minute > 59 {
        return Err(bad_time(time_token));
    }
    let tz = match tz_token {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| RemindClawError::Format(format!("I don't know the timezone '{name}'")))?,
        None => home,
    };
    Ok((hour, minute, tz))
}

/// Compute the next instant matching `hour:minute` on the wall clock of `tz`
/// that is not strictly in the past relative to `now`. If today's occurrence
/// in that zone has already passed, roll to the same time tomorrow. Exactly
/// now counts as today.
pub fn resolve_next_clock_time(hour: u32, minute: u32, tz: Tz, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let today = now.with_timezone(&tz).date_naive();
    let mut target = zoned(tz, today, hour, minute)?.with_timezone(&Utc);
    if target < now {
        target = zoned(tz, today + Duration::days(1), hour, minute)?.with_timezone(&Utc);
    }
    Ok(target)
}

/// Resolve a wall-clock time on a given date in `tz`. Ambiguous local times
/// (clocks fell back) take the earlier offset; nonexistent ones (clocks
/// sprang forward) are nudged an hour ahead to the next valid instant.
fn zoned(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> Result<DateTime<Tz>> {
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| bad_time(&format!("{hour}:{minute:02}")))?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Ok(t),
        LocalResult::Ambiguous(earlier, _) => Ok(earlier),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .ok_or_else(|| bad_time(&format!("{hour}:{minute:02}"))),
    }
}

/// True if the token names a known timezone. The command layer uses this to
/// tell an optional timezone apart from the start of the message.
pub fn is_timezone(token: &str) -> bool {
    token.parse::<Tz>().is_ok()
}

/// Parse a weekday-letter token ("MWF") into ascending unique weekday codes
/// (Monday=0 .. Sunday=6). Unknown letters, duplicates, and the empty token
/// are all rejected.
pub fn parse_weekday_set(token: &str) -> Result<Vec<u8>> {
    let mut days: Vec<u8> = Vec::with_capacity(token.len());
    for letter in token.chars() {
        let upper = letter.to_ascii_uppercase();
        match WEEKDAY_LETTERS.iter().position(|&l| l == upper) {
            Some(day) if !days.contains(&(day as u8)) => days.push(day as u8),
            _ => return Err(bad_weekdays(token)),
        }
    }
    if days.is_empty() {
        return Err(bad_weekdays(token));
    }
    days.sort_unstable();
    Ok(days)
}

fn bad_duration(token: &str) -> RemindClawError {
    RemindClawError::Format(format!(
        "Sorry I didn't understand '{token}'. Try something like '10m' for ten minutes"
    ))
}

fn bad_time(token: &str) -> RemindClawError {
    RemindClawError::Format(format!(
        "Sorry I didn't understand '{token}'. Times are 24-hour HH:MM"
    ))
}

fn bad_weekdays(token: &str) -> RemindClawError {
    RemindClawError::Format(format!(
        "I didn't understand '{token}'. Weekdays are any of MTWRFSU, Monday through Sunday"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relative_units() {
        assert_eq!(parse_relative("12m").unwrap(), 12 * 60);
        assert_eq!(parse_relative("12h").unwrap(), 12 * 3_600);
        assert_eq!(parse_relative("12d").unwrap(), 12 * 86_400);
        assert_eq!(parse_relative("1m").unwrap(), 60);
    }

    #[test]
    fn test_parse_relative_unknown_unit() {
        let err = parse_relative("12x").unwrap_err();
        assert!(err.to_string().starts_with("Sorry I didn't understand '12x'"));
    }

    #[test]
    fn test_parse_relative_garbage() {
        for token in ["", "m", "x12", "0m", "-5m", "1.5h"] {
            let err = parse_relative(token).unwrap_err();
            assert!(err.to_string().starts_with("Sorry I didn't understand"), "{token}");
        }
    }

    #[test]
    fn test_parse_absolute_home_timezone() {
        let (hour, minute, tz) = parse_absolute("13:00", None, chrono_tz::UTC).unwrap();
        assert_eq!((hour, minute), (13, 0));
        assert_eq!(tz, chrono_tz::UTC);
    }

    #[test]
    fn test_parse_absolute_named_timezone() {
        let (hour, minute, tz) = parse_absolute("6:30", Some("US/Central"), chrono_tz::UTC).unwrap();
        assert_eq!((hour, minute), (6, 30));
        assert_eq!(tz, chrono_tz::US::Central);
    }

    #[test]
    fn test_parse_absolute_unknown_timezone() {
        let err = parse_absolute("6:30", Some("Mars/Olympus"), chrono_tz::UTC).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_parse_absolute_bad_tokens() {
        for token in ["25:00", "12:60", "noon", "12", ":30", "aa:bb"] {
            assert!(parse_absolute(token, None, chrono_tz::UTC).is_err(), "{token}");
        }
    }

    #[test]
    fn test_resolve_future_today() {
        // 2013-12-11 12:00 in US/Eastern is 17:00 UTC. 13:00 local has not
        // passed yet, so it resolves to today 18:00 UTC.
        let now = Utc.with_ymd_and_hms(2013, 12, 11, 17, 0, 0).unwrap();
        let when = resolve_next_clock_time(13, 0, chrono_tz::US::Eastern, now).unwrap();
        assert_eq!(when, Utc.with_ymd_and_hms(2013, 12, 11, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_past_rolls_to_tomorrow() {
        // 6:00 local is behind 12:00 local, so it rolls to tomorrow.
        let now = Utc.with_ymd_and_hms(2013, 12, 11, 17, 0, 0).unwrap();
        let when = resolve_next_clock_time(6, 0, chrono_tz::US::Eastern, now).unwrap();
        assert_eq!(when, Utc.with_ymd_and_hms(2013, 12, 12, 11, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_exact_now_fires_today() {
        let now = Utc.with_ymd_and_hms(2013, 12, 11, 17, 0, 0).unwrap();
        let when = resolve_next_clock_time(12, 0, chrono_tz::US::Eastern, now).unwrap();
        assert_eq!(when, now);
    }

    #[test]
    fn test_parse_weekday_set_normalizes() {
        assert_eq!(parse_weekday_set("MWF").unwrap(), vec![0, 2, 4]);
        assert_eq!(parse_weekday_set("FWM").unwrap(), vec![0, 2, 4]);
        assert_eq!(parse_weekday_set("mwf").unwrap(), vec![0, 2, 4]);
        assert_eq!(parse_weekday_set("MTWRFSU").unwrap(), vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(parse_weekday_set("U").unwrap(), vec![6]);
    }

    #[test]
    fn test_is_timezone() {
        assert!(is_timezone("US/Eastern"));
        assert!(is_timezone("UTC"));
        assert!(!is_timezone("this"));
        assert!(!is_timezone("#bots"));
    }

    #[test]
    fn test_parse_weekday_set_rejects() {
        for token in ["XYZ", "", "MM", "MWFQ", "M W"] {
            let err = parse_weekday_set(token).unwrap_err();
            assert!(err.to_string().contains("I didn't understand"), "{token}");
        }
    }
}
