use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use std::sync::LazyLock;

use super::task::TIMESTAMP_FORMAT;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<h>\d{1,2})(?::(?P<min>\d{2}))?\s*(?P<ampm>am|pm)?$").unwrap()
});

static TIME_HMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<h>\d{1,2}):(?P<min>\d{2}):(?P<sec>\d{2})$").unwrap());

static ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<y>\d{4})[-/](?P<m>\d{1,2})[-/](?P<d>\d{1,2})(?:[t ](?P<time>.+))?$").unwrap()
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<m>\d{1,2})[-/](?P<d>\d{1,2})(?:[t ](?P<time>.+))?$").unwrap()
});

/// Shorthands offered when a due token is incomplete.
pub const DUE_SHORTHANDS: &[&str] = &[
    "today",
    "tomorrow",
    "tmr",
    "next-week",
    "next-mon",
    "next-tue",
    "next-wed",
    "next-thu",
    "next-fri",
    "next-sat",
    "next-sun",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "noon",
    "midnight",
];

const UNRECOGNIZED_HINT: &str =
    "Unrecognized date. Try: today, tomorrow, next-mon, 2026-02-10, 2026-02-10T15:30, 15:30";

/// A due date ready for the API plus a short human rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDue {
    /// `YYYY-MM-DDTHH:MM:SS`, exactly 19 characters.
    pub due: String,
    /// `YYYY-MM-DD HH:MM`
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DateParseError {
    message: String,
}

impl DateParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Parses shorthand and natural-language due dates.
///
/// Supported, in priority order:
/// - `today`, `tomorrow`, `yesterday`, `next-week` (and short aliases)
/// - `next-<weekday>` and bare weekday names, never resolving to today
/// - time only: `15:30`, `3pm`, `3:15pm`, `noon`, `midnight`, `15:30:45`
/// - `2026-02-10`, `2026/2/10`, `2026-02-10T15:30`, `2026-02-10 3pm`
/// - `2/10`, `02-10 15:00` in the current year (next year once passed)
#[derive(Debug, Clone, Copy)]
pub struct DateParser {
    default_time: NaiveTime,
}

impl Default for DateParser {
    fn default() -> Self {
        Self {
            default_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl DateParser {
    pub fn new(default_time: NaiveTime) -> Self {
        Self { default_time }
    }

    pub fn default_time(&self) -> NaiveTime {
        self.default_time
    }

    pub fn parse(&self, text: &str, now: NaiveDateTime) -> Result<ParsedDue, DateParseError> {
        let raw = normalize(text);
        if raw.is_empty() {
            return Err(DateParseError::new("Empty date"));
        }

        let dt = self.parse_datetime(&raw, now)?;
        Ok(ParsedDue {
            due: dt.format(TIMESTAMP_FORMAT).to_string(),
            display: dt.format("%Y-%m-%d %H:%M").to_string(),
        })
    }

    fn parse_datetime(&self, raw: &str, now: NaiveDateTime) -> Result<NaiveDateTime, DateParseError> {
        let today = now.date();

        match raw {
            "today" | "tod" => return Ok(today.and_time(self.default_time)),
            "tomorrow" | "tmr" | "tmrw" => {
                return Ok((today + Duration::days(1)).and_time(self.default_time));
            }
            "yesterday" | "yest" => {
                return Ok((today - Duration::days(1)).and_time(self.default_time));
            }
            "next-week" | "nextweek" => {
                return Ok((today + Duration::days(7)).and_time(self.default_time));
            }
            _ => {}
        }

        if let Some(name) = raw.strip_prefix("next-") {
            let target = parse_weekday(name)
                .ok_or_else(|| DateParseError::new(format!("Unknown weekday: {}", name)))?;
            return Ok(next_weekday(today, target).and_time(self.default_time));
        }

        if let Some(target) = parse_weekday(raw) {
            return Ok(next_weekday(today, target).and_time(self.default_time));
        }

        if looks_like_time(raw) {
            let time = parse_time(raw)?;
            let candidate = today.and_time(time);
            if candidate < now {
                return Ok((today + Duration::days(1)).and_time(time));
            }
            return Ok(candidate);
        }

        if let Some(caps) = ISO_RE.captures(raw) {
            let date = safe_date(
                parse_number(&caps["y"])?,
                parse_number(&caps["m"])?,
                parse_number(&caps["d"])?,
            )?;
            let time = match caps.name("time") {
                Some(t) => parse_time(t.as_str().trim())?,
                None => self.default_time,
            };
            return Ok(date.and_time(time));
        }

        if let Some(caps) = MONTH_DAY_RE.captures(raw) {
            let month = parse_number(&caps["m"])?;
            let day = parse_number(&caps["d"])?;
            let year = today.year();
            let mut date = safe_date(year, month, day)?;
            if date < today {
                date = safe_date(year + 1, month, day)?;
            }
            let time = match caps.name("time") {
                Some(t) => parse_time(t.as_str().trim())?,
                None => self.default_time,
            };
            return Ok(date.and_time(time));
        }

        Err(DateParseError::new(UNRECOGNIZED_HINT))
    }
}

/// Shorthands starting with `prefix` (after the same normalization the parser
/// applies). An empty prefix returns the head of the list.
pub fn suggest_due_shorthands(prefix: &str, limit: usize) -> Vec<&'static str> {
    let prefix = normalize(prefix);
    DUE_SHORTHANDS
        .iter()
        .copied()
        .filter(|s| s.starts_with(prefix.as_str()))
        .take(limit)
        .collect()
}

fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace('_', "-")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
        "wed" | "weds" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thur" | "thurs" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next occurrence of `target` strictly after `base`.
fn next_weekday(base: NaiveDate, target: Weekday) -> NaiveDate {
    let current = base.weekday().num_days_from_monday() as i64;
    let wanted = target.num_days_from_monday() as i64;
    let mut delta = (wanted - current).rem_euclid(7);
    if delta == 0 {
        delta = 7;
    }
    base + Duration::days(delta)
}

fn looks_like_time(raw: &str) -> bool {
    matches!(raw, "noon" | "midnight") || TIME_RE.is_match(raw) || TIME_HMS_RE.is_match(raw)
}

fn parse_time(raw: &str) -> Result<NaiveTime, DateParseError> {
    let s = raw.trim().to_lowercase();
    match s.as_str() {
        "noon" => return safe_time(12, 0, 0),
        "midnight" => return safe_time(0, 0, 0),
        _ => {}
    }

    if let Some(caps) = TIME_RE.captures(&s) {
        let mut hour: u32 = parse_number(&caps["h"])?;
        let minute: u32 = match caps.name("min") {
            Some(m) => parse_number(m.as_str())?,
            None => 0,
        };
        if let Some(ampm) = caps.name("ampm").map(|m| m.as_str()) {
            if !(1..=12).contains(&hour) {
                return Err(DateParseError::new(format!("Invalid hour for {}: {}", ampm, hour)));
            }
            hour = match (ampm, hour) {
                ("am", 12) => 0,
                ("am", h) => h,
                (_, 12) => 12,
                (_, h) => h + 12,
            };
        }
        return safe_time(hour, minute, 0);
    }

    if let Some(caps) = TIME_HMS_RE.captures(&s) {
        return safe_time(
            parse_number(&caps["h"])?,
            parse_number(&caps["min"])?,
            parse_number(&caps["sec"])?,
        );
    }

    Err(DateParseError::new(format!("Invalid time: {}", raw)))
}

fn parse_number<T: std::str::FromStr>(digits: &str) -> Result<T, DateParseError> {
    digits
        .parse::<T>()
        .map_err(|_| DateParseError::new(format!("Invalid number: {}", digits)))
}

fn safe_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateParseError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::new(format!("Invalid date: {:04}-{:02}-{:02}", year, month, day)))
}

fn safe_time(hour: u32, minute: u32, second: u32) -> Result<NaiveTime, DateParseError> {
    NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| DateParseError::new(format!("Invalid time: {:02}:{:02}:{:02}", hour, minute, second)))
}
