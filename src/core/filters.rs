//! Structured query filters: `p:high`, `priority:3`, `due:today`, ...

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

use super::task::{Task, parse_timestamp_prefix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DueFilter {
    Today,
    Tomorrow,
    Overdue,
    Future,
    Week,
    NextMonth,
    NoDue,
}

impl DueFilter {
    /// Supported literals, in suggestion order.
    pub const ALL: [DueFilter; 7] = [
        Self::Today,
        Self::Tomorrow,
        Self::Overdue,
        Self::Future,
        Self::Week,
        Self::NextMonth,
        Self::NoDue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Overdue => "overdue",
            Self::Future => "future",
            Self::Week => "week",
            Self::NextMonth => "next-month",
            Self::NoDue => "nodue",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }
}

/// Priority and due filters extracted from a query. Both dimensions empty
/// means the spec is inactive and matches every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilterSpec {
    pub priority_values: BTreeSet<i64>,
    pub due_values: BTreeSet<DueFilter>,
}

impl TaskFilterSpec {
    pub fn is_active(&self) -> bool {
        !self.priority_values.is_empty() || !self.due_values.is_empty()
    }
}

/// Split `query` into a filter spec and the remaining free text.
///
/// Unrecognised filter values stay in the text untouched.
pub fn parse_query_filters(query: &str) -> (TaskFilterSpec, String) {
    let mut spec = TaskFilterSpec::default();
    let mut remaining: Vec<&str> = Vec::new();

    for token in query.split_whitespace() {
        let lower = token.to_lowercase();

        if let Some(value) = lower.strip_prefix("p:").or_else(|| lower.strip_prefix("priority:")) {
            match parse_priority_value(value.trim()) {
                Some(p) => {
                    spec.priority_values.insert(p);
                }
                None => remaining.push(token),
            }
            continue;
        }

        if let Some(value) = lower.strip_prefix("due:") {
            match DueFilter::from_keyword(value.trim()) {
                Some(f) => {
                    spec.due_values.insert(f);
                }
                None => remaining.push(token),
            }
            continue;
        }

        remaining.push(token);
    }

    (spec, remaining.join(" "))
}

fn parse_priority_value(value: &str) -> Option<i64> {
    match value {
        "high" => Some(1),
        "medium" => Some(5),
        "low" => Some(9),
        "normal" => Some(0),
        v if !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()) => v
            .parse::<i64>()
            .ok()
            .filter(|p| (1..=9).contains(p)),
        _ => None,
    }
}

/// The partial value of a trailing `due`/`due:<partial>` token, for
/// autocompletion. `None` when there is no such token or it is already a
/// complete filter.
///
/// - `"report due:to"` → `Some("to")`
/// - `"due:"` / `"due"` → `Some("")`
/// - `"due:today"` → `None`
pub fn extract_due_filter_fragment(query: &str) -> Option<String> {
    let last = query.split_whitespace().last()?.to_lowercase();
    if last == "due" {
        return Some(String::new());
    }
    let fragment = last.strip_prefix("due:")?.trim();
    if DueFilter::from_keyword(fragment).is_some() {
        return None;
    }
    Some(fragment.to_string())
}

pub fn get_due_filter_suggestions(fragment: &str, limit: usize) -> Vec<&'static str> {
    let normalized = fragment.trim().to_lowercase().replace('_', "-");
    DueFilter::ALL
        .iter()
        .map(DueFilter::as_str)
        .filter(|v| v.starts_with(normalized.as_str()))
        .take(limit)
        .collect()
}

/// Replace the trailing `due`/`due:...` token with `due:<chosen>`, or append
/// one when the query has none.
pub fn rewrite_due_filter_query(raw_query: &str, chosen: &str) -> String {
    let replacement = format!("due:{}", chosen);
    let mut tokens: Vec<&str> = raw_query.split_whitespace().collect();
    let trailing_due = tokens.last().is_some_and(|t| {
        let lower = t.to_lowercase();
        lower == "due" || lower.starts_with("due:")
    });
    if trailing_due {
        tokens.pop();
    }
    tokens.push(&replacement);
    tokens.join(" ")
}

/// Priorities are OR'd, due buckets are OR'd, and the two dimensions are
/// AND'd when both are active.
pub fn matches_task_filters(task: &Task, spec: &TaskFilterSpec, now: NaiveDateTime) -> bool {
    if !spec.is_active() {
        return true;
    }
    if !spec.priority_values.is_empty() && !spec.priority_values.contains(&task.priority_value()) {
        return false;
    }
    if !spec.due_values.is_empty() && !matches_due(task, &spec.due_values, now) {
        return false;
    }
    true
}

fn matches_due(task: &Task, filters: &BTreeSet<DueFilter>, now: NaiveDateTime) -> bool {
    let due_text = match task.due_text() {
        Some(d) => d,
        None => return filters.contains(&DueFilter::NoDue),
    };
    // Malformed due values never match any bucket, not even `nodue`.
    let due = match parse_timestamp_prefix(due_text) {
        Some(d) => d,
        None => return false,
    };

    let due_date = due.date();
    let today = now.date();

    filters.iter().any(|filter| match filter {
        DueFilter::Today => due_date == today,
        DueFilter::Tomorrow => due_date == today + Duration::days(1),
        DueFilter::Overdue => due < now,
        DueFilter::Future => due > now,
        DueFilter::Week => today <= due_date && due_date <= today + Duration::days(7),
        DueFilter::NextMonth => next_month_bounds(today)
            .is_some_and(|(start, end)| start <= due_date && due_date < end),
        DueFilter::NoDue => false,
    })
}

/// `[first day of next month, first day of the month after)`.
fn next_month_bounds(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = first_of_following_month(today.year(), today.month())?;
    let end = first_of_following_month(start.year(), start.month())?;
    Some((start, end))
}

fn first_of_following_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}
