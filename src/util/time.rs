//! Parsing of the provider's chapter update times.
//!
//! The provider reports update times either relative to now, in Vietnamese
//! (`"5 phút trước"`, `"2 ngày trước"`), or as one of two absolute formats:
//! `"HH:MM DD/MM"` for the current year and `"DD-MM-YYYY"`.
//!
//! Units are matched by substring in a fixed order: seconds, minutes, hours,
//! days, weeks, months (28 days) and years. The first unit found wins, even
//! when a string mentions several. Strings without a unit are handed to the
//! absolute formats and yield `None` when those do not match either.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeDelta, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Provider wall clock, Indochina Time.
const PROVIDER_UTC_OFFSET_SECS: i32 = 7 * 3600;

const UNITS: [(&[&str], i64); 7] = [
    (&["giây", "secs"], 1),
    (&["phút"], 60),
    (&["giờ"], 3600),
    (&["ngày"], 86_400),
    (&["tuần"], 86_400 * 7),
    (&["tháng"], 86_400 * 7 * 4),
    (&["năm"], 31_556_952),
];

static TIME_AND_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{1,2})\s+(\d{1,2})/(\d{1,2})$").expect("valid time regex")
});

static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})$").expect("valid date regex"));

/// Parses a provider time string relative to the current time.
///
/// # Examples
///
/// ```rust
/// use goctruyen::util::parse_time;
///
/// assert!(parse_time("5 phút trước").is_some());
/// assert!(parse_time("20-10-2024").is_some());
/// assert!(parse_time("không rõ").is_none());
/// ```
pub fn parse_time(input: &str) -> Option<DateTime<Utc>> {
    parse_time_at(input, Utc::now())
}

/// Parses a provider time string relative to `now`.
///
/// Returns `None` when no unit matches and the text is not one of the
/// absolute formats, or when the computed date is out of range.
pub fn parse_time_at(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    for (keywords, unit_secs) in UNITS {
        if keywords.iter().any(|keyword| input.contains(keyword)) {
            let magnitude = leading_magnitude(input)?;
            let delta = TimeDelta::try_seconds(magnitude.checked_mul(unit_secs)?)?;
            return now.checked_sub_signed(delta);
        }
    }

    parse_absolute(input.trim(), now)
}

/// Leading digits of the string, or 1 for digit-less strings like "a minute ago".
///
/// `None` when the digits overflow.
fn leading_magnitude(input: &str) -> Option<i64> {
    let digits: String = input.chars().take_while(char::is_ascii_digit).collect();
    let value = if digits.is_empty() {
        0
    } else {
        digits.parse::<i64>().ok()?
    };
    if value == 0 && input.contains('a') {
        Some(1)
    } else {
        Some(value)
    }
}

fn parse_absolute(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let offset = FixedOffset::east_opt(PROVIDER_UTC_OFFSET_SECS)?;

    if input.contains(':') {
        let caps = TIME_AND_DAY.captures(input)?;
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        let month = caps[4].parse().ok()?;
        let year = now.with_timezone(&offset).year();
        return local_to_utc(offset, year, month, day, hour, minute);
    }

    let caps = DAY_MONTH_YEAR.captures(input)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    local_to_utc(offset, year, month, day, 0, 0)
}

fn local_to_utc(
    offset: FixedOffset,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
