//! Perform the action behind an activated result.

use serde_json::Value;
use std::collections::BTreeMap;

use super::action::Action;
use super::handlers::api_error_item;
use super::items::ResultItem;
use super::session::{FETCH_LIMIT, Session};
use super::LauncherError;
use crate::api::{ApiError, NewTask};
use crate::core::containers::ContainerKind;
use crate::core::dummy::build_dummy_task_specs;

const SAMPLE_MAX_CHARS: usize = 60;

/// What the host should do after an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Close,
    Fill(String),
    /// Replace the result list.
    Show(Vec<ResultItem>),
}

pub fn handle_action(session: &mut Session, action: Action) -> Result<Outcome, LauncherError> {
    log::info!("Activating {}", action.name());
    if let Ok(payload) = serde_json::to_string(&action) {
        log::debug!("Action payload: {}", payload);
    }

    match action {
        Action::CreateTask {
            title,
            description,
            due,
            priority,
        } => {
            let task = NewTask {
                title,
                description,
                due,
                priority,
            };
            let result = session.api()?.create_task(&task);
            match result {
                Ok(created) => {
                    log::info!("Created task {:?} ({})", task.title, created.id().unwrap_or("?"));
                    session.cache_mut().invalidate();
                    Ok(Outcome::Close)
                }
                Err(e) => Ok(failure("Failed to create task", &e)),
            }
        }
        Action::CompleteTask { id, title } => {
            let result = session.api()?.close_task(&id);
            match result {
                Ok(()) => {
                    log::info!("Completed task {:?} ({})", title, id);
                    session.cache_mut().invalidate();
                    Ok(Outcome::Close)
                }
                Err(e) => Ok(failure("Failed to complete task", &e)),
            }
        }
        Action::ShowList { kind, list_id, name } => {
            let keyword = session.prefs().keyword();
            let prefix = match kind {
                Some(ContainerKind::List) => "list",
                Some(ContainerKind::Project) => "project",
                Some(ContainerKind::Space) => "space",
                None => "in",
            };
            let target = match (list_id, name) {
                (Some(id), _) => format!("id:{}", id),
                (None, Some(name)) => name_target(&name),
                (None, None) => String::new(),
            };
            let target = if target.contains(char::is_whitespace) {
                format!("\"{}\"", target)
            } else {
                target
            };
            Ok(Outcome::Fill(format!("{} {} {} ", keyword, prefix, target)))
        }
        Action::CreateDummyTasks { count, title_prefix } => {
            let specs = build_dummy_task_specs(count, &title_prefix, session.now());
            let total = specs.len();
            let mut created = 0;
            let mut last_error = None;
            for spec in &specs {
                match session.api()?.create_task(spec) {
                    Ok(_) => created += 1,
                    Err(e @ ApiError::Auth { .. }) => {
                        last_error = Some(e);
                        break;
                    }
                    Err(e) => {
                        log::warn!("Dummy task {:?} failed: {}", spec.title, e);
                        last_error = Some(e);
                    }
                }
            }
            session.cache_mut().invalidate();
            log::info!("Created {} of {} dummy tasks", created, total);
            Ok(Outcome::Show(vec![summary(
                format!("Created {} of {} dummy tasks", created, total),
                last_error.as_ref(),
            )]))
        }
        Action::CompleteDummyTasks { title_prefix } => {
            let response = match session.api()?.list_tasks(FETCH_LIMIT, None) {
                Ok(response) => response,
                Err(e) => return Ok(failure("Failed to list tasks", &e)),
            };
            let ids: Vec<String> = response
                .tasks()
                .iter()
                .filter(|t| !t.id.is_empty() && t.title.as_deref().is_some_and(|t| t.starts_with(&title_prefix)))
                .map(|t| t.id.clone())
                .collect();

            let mut closed = 0;
            let mut last_error = None;
            for id in &ids {
                match session.api()?.close_task(id) {
                    Ok(()) => closed += 1,
                    Err(e) => {
                        log::warn!("Closing dummy task {} failed: {}", id, e);
                        last_error = Some(e);
                    }
                }
            }
            session.cache_mut().invalidate();
            log::info!("Completed {} of {} dummy tasks", closed, ids.len());
            Ok(Outcome::Show(vec![summary(
                format!("Completed {} of {} dummy tasks", closed, ids.len()),
                last_error.as_ref(),
            )]))
        }
        Action::DumpTaskFields => {
            if let Err(LauncherError::Api(e)) = session.ensure_tasks(false) {
                return Ok(Outcome::Show(vec![api_error_item(&e)]));
            }
            let fields = task_field_samples(session);
            if fields.is_empty() {
                return Ok(Outcome::Show(vec![ResultItem::new("No tasks cached", "Nothing to inspect")]));
            }
            log::info!("Task fields: {}", fields.keys().cloned().collect::<Vec<_>>().join(", "));
            Ok(Outcome::Show(
                fields
                    .into_iter()
                    .map(|(field, sample)| ResultItem::new(field, sample))
                    .collect(),
            ))
        }
    }
}

/// A name can't carry `"` through the quoted query syntax; the longest
/// quote-free part still matches it as a substring.
fn name_target(name: &str) -> String {
    name.split('"')
        .map(str::trim)
        .max_by_key(|part| part.len())
        .unwrap_or_default()
        .to_string()
}

fn failure(title: &str, error: &ApiError) -> Outcome {
    log::error!("{}: {}", title, error);
    let mut item = api_error_item(error);
    if !matches!(error, ApiError::Auth { .. }) {
        item.name = title.to_string();
    }
    Outcome::Show(vec![item])
}

fn summary(name: String, last_error: Option<&ApiError>) -> ResultItem {
    let description = match last_error {
        Some(e) => format!("Last error: {}", e),
        None => "Cache cleared".to_string(),
    };
    ResultItem::new(name, description)
}

/// Every top-level field across cached tasks with the first non-null value
/// seen for it.
fn task_field_samples(session: &Session) -> BTreeMap<String, String> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let Some(response) = session.cache().get_full_response() else {
        return fields;
    };
    for task in response.tasks() {
        let Ok(Value::Object(obj)) = serde_json::to_value(task) else {
            continue;
        };
        for (key, value) in obj {
            let sample = fields.entry(key).or_default();
            if sample.is_empty() && !value.is_null() {
                *sample = truncate_sample(&value);
            }
        }
    }
    fields
}

fn truncate_sample(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() <= SAMPLE_MAX_CHARS {
        return text;
    }
    let head: String = text.chars().take(SAMPLE_MAX_CHARS - 1).collect();
    format!("{}…", head)
}
