pub mod morgen;

use serde::{Deserialize, Serialize};

use crate::core::task::TasksResponse;

/// Payload for `/tasks/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `YYYY-MM-DDTHH:MM:SS`, no zone suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    /// 0 = undefined, 1 = highest, 9 = lowest.
    #[serde(default)]
    pub priority: i64,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            due: None,
            priority: 0,
        }
    }
}

/// `{"data": {"id": ...}}` returned by `/tasks/create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedTask {
    #[serde(default)]
    pub data: CreatedTaskData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedTaskData {
    #[serde(default)]
    pub id: Option<String>,
}

impl CreatedTask {
    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid API key. Check your Morgen API key in preferences.")]
    Auth { body: Option<String> },
    #[error("Rate limit exceeded. Try again later.")]
    RateLimit { body: Option<String> },
    #[error("Bad request: {message}")]
    Validation { message: String },
    #[error("Cannot reach Morgen API: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid JSON response from API: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Auth { .. } => Some(401),
            Self::RateLimit { .. } => Some(429),
            Self::Api { status, .. } => Some(*status),
            Self::Validation { .. } | Self::Network(_) | Self::InvalidResponse(_) => None,
        }
    }

    /// Rate limiting and connectivity problems, where stale data is still
    /// worth showing.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit { .. } | Self::Network(_))
    }
}

/// The Morgen task endpoints the launcher needs.
pub trait TaskApi {
    /// `limit` is capped at 100 by the server.
    fn list_tasks(&self, limit: usize, updated_after: Option<&str>) -> Result<TasksResponse, ApiError>;

    fn create_task(&self, task: &NewTask) -> Result<CreatedTask, ApiError>;

    fn close_task(&self, id: &str) -> Result<(), ApiError>;
}

/// Reject payloads the API would answer with a 400 anyway.
pub fn validate_new_task(task: &NewTask) -> Result<(), ApiError> {
    if task.title.trim().is_empty() {
        return Err(ApiError::Validation {
            message: "Task title is required".to_string(),
        });
    }
    if !(0..=9).contains(&task.priority) {
        return Err(ApiError::Validation {
            message: format!("Priority must be between 0 and 9, got {}", task.priority),
        });
    }
    if let Some(due) = &task.due {
        if !is_api_timestamp(due) {
            return Err(ApiError::Validation {
                message: format!("Due date must be YYYY-MM-DDTHH:MM:SS (19 characters), got {:?}", due),
            });
        }
    }
    Ok(())
}

fn is_api_timestamp(due: &str) -> bool {
    let bytes = due.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b'T',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}
