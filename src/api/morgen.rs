use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tokio::runtime::Runtime;

use super::{ApiError, CreatedTask, NewTask, TaskApi, validate_new_task};
use crate::core::task::TasksResponse;

pub const BASE_URL: &str = "https://api.morgen.so/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_LIST_LIMIT: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ClientInitError {
    #[error("API key cannot be empty")]
    EmptyApiKey,
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Blocking Morgen v3 client.
///
/// The launcher handles one event at a time, so requests run to completion on
/// a private current-thread runtime.
pub struct MorgenClient {
    base_url: String,
    api_key: String,
    http: Client,
    runtime: Runtime,
}

impl MorgenClient {
    pub fn new(api_key: &str) -> Result<Self, ClientInitError> {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, ClientInitError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ClientInitError::EmptyApiKey);
        }
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
            runtime,
        })
    }

    fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);

        let text = self.runtime.block_on(async {
            let mut req = self
                .http
                .request(method, &url)
                .header(AUTHORIZATION, format!("ApiKey {}", self.api_key))
                .header(ACCEPT, "application/json");
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(body) = &body {
                req = req.json(body);
            }

            let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|e| ApiError::Network(format!("failed to read response: {}", e)))?;
            check_status(status, text)
        })?;

        decode_body(&text)
    }
}

impl TaskApi for MorgenClient {
    fn list_tasks(&self, limit: usize, updated_after: Option<&str>) -> Result<TasksResponse, ApiError> {
        log::info!("Fetching tasks from Morgen API (limit={})", limit);
        let response: TasksResponse =
            self.request(Method::GET, "/tasks/list", &list_params(limit, updated_after), None)?;
        log::info!("Retrieved {} tasks from API", response.tasks().len());
        Ok(response)
    }

    fn create_task(&self, task: &NewTask) -> Result<CreatedTask, ApiError> {
        validate_new_task(task)?;
        let mut body = task.clone();
        body.title = body.title.trim().to_string();
        body.description = body.description.filter(|d| !d.trim().is_empty());

        log::info!("Creating task: {}", body.title);
        let body = serde_json::to_value(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let created: CreatedTask = self.request(Method::POST, "/tasks/create", &[], Some(body))?;
        log::info!("Task created: {}", created.id().unwrap_or("<unknown id>"));
        Ok(created)
    }

    fn close_task(&self, id: &str) -> Result<(), ApiError> {
        log::info!("Closing task: {}", id);
        let _: serde_json::Value = self.request(Method::POST, "/tasks/close", &[], Some(json!({ "id": id })))?;
        Ok(())
    }
}

fn list_params(limit: usize, updated_after: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![("limit", limit.min(MAX_LIST_LIMIT).to_string())];
    if let Some(after) = updated_after.filter(|a| !a.is_empty()) {
        params.push(("updatedAfter", after.to_string()));
    }
    params
}

/// Map non-success statuses onto the error taxonomy, passing the body through
/// otherwise.
fn check_status(status: StatusCode, body: String) -> Result<String, ApiError> {
    if status.is_success() {
        return Ok(body);
    }
    let body = Some(body).filter(|b| !b.trim().is_empty());
    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::Auth { body },
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimit { body },
        StatusCode::BAD_REQUEST => ApiError::Validation {
            message: body.unwrap_or_else(|| "invalid parameters".to_string()),
        },
        other => ApiError::Api {
            status: other.as_u16(),
            message: body.unwrap_or_else(|| other.canonical_reason().unwrap_or("unknown").to_string()),
        },
    })
}

/// Empty bodies decode as `{}`.
fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    serde_json::from_str(text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(MorgenClient::new("   "), Err(ClientInitError::EmptyApiKey)));
    }

    #[test]
    fn key_is_trimmed() {
        let client = MorgenClient::new("  secret ").unwrap();
        assert_eq!(client.api_key, "secret");
    }

    #[test]
    fn list_limit_is_capped() {
        assert_eq!(list_params(500, None), vec![("limit", "100".to_string())]);
        assert_eq!(
            list_params(20, Some("2026-02-06T08:00:00")),
            vec![("limit", "20".to_string()), ("updatedAfter", "2026-02-06T08:00:00".to_string())]
        );
        assert_eq!(list_params(20, Some("")).len(), 1);
    }

    #[test]
    fn statuses_map_to_errors() {
        assert_eq!(check_status(StatusCode::OK, "x".into()).unwrap(), "x");
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, String::new()),
            Err(ApiError::Auth { body: None })
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            Err(ApiError::RateLimit { body: Some(_) })
        ));
        match check_status(StatusCode::BAD_REQUEST, "due is invalid".into()) {
            Err(ApiError::Validation { message }) => assert_eq!(message, "due is invalid"),
            other => panic!("unexpected {:?}", other),
        }
        match check_status(StatusCode::BAD_GATEWAY, String::new()) {
            Err(ApiError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bodies_decode_leniently() {
        let value: serde_json::Value = decode_body("").unwrap();
        assert_eq!(value, json!({}));
        let response: TasksResponse = decode_body(r#"{"data": {"tasks": [{"id": "t1", "priority": "5"}]}}"#).unwrap();
        assert_eq!(response.tasks()[0].priority, Some(5));
        let response: TasksResponse =
            decode_body(r#"{"data": {"tasks": [{"id": "t1"}, "broken", {"id": "t2"}]}}"#).unwrap();
        assert_eq!(response.tasks().len(), 2);
        assert!(matches!(
            decode_body::<TasksResponse>("<html>"),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn invalid_payload_never_hits_the_network() {
        let client = MorgenClient::with_base_url("key", "http://127.0.0.1:9").unwrap();
        let mut task = NewTask::new("x");
        task.priority = 12;
        assert!(matches!(client.create_task(&task), Err(ApiError::Validation { .. })));
    }
}
