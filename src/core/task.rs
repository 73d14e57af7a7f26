use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Exact due/timestamp shape the Morgen API speaks: `YYYY-MM-DDTHH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A task as returned by `/tasks/list`.
///
/// Only the fields the launcher reasons about are typed. Everything else is
/// kept in `extra` so a cached snapshot round-trips the payload untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 0/absent = undefined, 1 = highest, 9 = lowest.
    #[serde(default, deserialize_with = "lenient_priority", skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_list_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub task_list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => "Untitled",
        }
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("").trim()
    }

    pub fn priority_value(&self) -> i64 {
        self.priority.unwrap_or(0)
    }

    /// The raw due string, trimmed; `None` when absent or blank.
    pub fn due_text(&self) -> Option<&str> {
        self.due.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    pub fn due_at(&self) -> Option<NaiveDateTime> {
        self.due_text().and_then(parse_timestamp_prefix)
    }

    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.created.as_deref().and_then(parse_timestamp_prefix)
    }
}

/// Full `/tasks/list` response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksResponse {
    #[serde(default)]
    pub data: TasksData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksData {
    /// Entries that are not task objects are dropped, not fatal.
    #[serde(default, deserialize_with = "lenient_tasks")]
    pub tasks: Vec<Task>,
    /// `lists`, `taskLists`, `projects`, `spaces`, `labelDefs`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TasksResponse {
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            data: TasksData {
                tasks,
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }
}

/// Parse the first 19 characters of an API timestamp.
///
/// Accepts a trailing zone suffix or fractional seconds (both ignored), a
/// minute-precision time, or a bare date (midnight).
pub fn parse_timestamp_prefix(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let prefix: String = text.chars().take(19).collect();
    if let Ok(dt) = NaiveDateTime::parse_from_str(&prefix, TIMESTAMP_FORMAT) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&prefix, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    let minutes: String = text.chars().take(16).collect();
    if let Ok(dt) = NaiveDateTime::parse_from_str(&minutes, "%Y-%m-%dT%H:%M") {
        return Some(dt);
    }
    if text.chars().count() == 10 {
        return NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0));
    }
    None
}

/// Stringify a scalar JSON value (strings trimmed); objects, arrays, bools and
/// null yield `None`, as do blank strings.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_tasks<'de, D>(deserializer: D) -> Result<Vec<Task>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Task>(entry) {
            Ok(task) => Some(task),
            Err(e) => {
                log::warn!("Skipping malformed task entry: {}", e);
                None
            }
        })
        .collect())
}
