use chrono::{Duration, NaiveDateTime};

use super::task::{Task, parse_timestamp_prefix};

const DESCRIPTION_MAX_CHARS: usize = 80;

/// `OVERDUE !! Title`: overdue marker, priority icon, then the title.
pub fn format_for_display(task: &Task, now: NaiveDateTime) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if is_overdue(task.due_text(), now) {
        parts.push("OVERDUE");
    }
    let icon = get_priority_icon(task.priority);
    if !icon.is_empty() {
        parts.push(icon);
    }
    parts.push(task.display_title());
    parts.join(" ")
}

/// `Due: Today 14:00 | Priority: High — description…`
pub fn format_subtitle(task: &Task, now: NaiveDateTime) -> String {
    let when = match task.due_text() {
        Some(due) => format!("Due: {}", format_due(due, now)),
        None => match task.created_at() {
            Some(created) => format!("Created: {}", created.format("%Y-%m-%d")),
            None => "Due: No due date".to_string(),
        },
    };

    let mut subtitle = format!("{} | Priority: {}", when, get_priority_label(task.priority));
    let description = task.description_text();
    if !description.is_empty() {
        subtitle.push_str(" — ");
        subtitle.push_str(&truncate(description, DESCRIPTION_MAX_CHARS));
    }
    subtitle
}

fn format_due(due: &str, now: NaiveDateTime) -> String {
    let Some(at) = parse_timestamp_prefix(due) else {
        return due.replace('T', " ");
    };

    let today = now.date();
    let label = if at.date() == today {
        format!("Today {}", at.format("%H:%M"))
    } else if at.date() == today + Duration::days(1) {
        format!("Tomorrow {}", at.format("%H:%M"))
    } else {
        at.format("%Y-%m-%d %H:%M").to_string()
    };

    if at < now {
        format!("{} (overdue!)", label)
    } else {
        label
    }
}

/// True when `due` parses and lies strictly before `now`.
pub fn is_overdue(due: Option<&str>, now: NaiveDateTime) -> bool {
    due.and_then(parse_timestamp_prefix)
        .is_some_and(|at| at < now)
}

/// Morgen buckets priorities into High (1-3), Medium (4-5) and Low (6-9).
pub fn get_priority_label(priority: Option<i64>) -> String {
    match priority.unwrap_or(0) {
        0 => "Normal".to_string(),
        1..=3 => "High".to_string(),
        4 | 5 => "Medium".to_string(),
        6..=9 => "Low".to_string(),
        n => format!("Priority {}", n),
    }
}

pub fn get_priority_icon(priority: Option<i64>) -> &'static str {
    match priority {
        Some(1) => "!!",
        Some(5) => "!",
        _ => "",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars - 1).collect();
    format!("{}…", head.trim_end())
}
