//! In-memory `TaskApi` for launcher tests.

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::rc::Rc;

use super::session::Session;
use crate::api::{ApiError, CreatedTask, CreatedTaskData, NewTask, TaskApi};
use crate::cache::TaskCache;
use crate::config::Preferences;
use crate::core::task::{Task, TasksResponse};

#[derive(Default)]
pub struct FakeState {
    pub response: TasksResponse,
    pub list_error: Option<fn() -> ApiError>,
    pub fail_writes: bool,
    pub list_calls: usize,
    pub created: Vec<NewTask>,
    pub closed: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeApi(pub Rc<RefCell<FakeState>>);

impl FakeApi {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let fake = Self::default();
        fake.0.borrow_mut().response = TasksResponse::from_tasks(tasks);
        fake
    }

    pub fn state(&self) -> std::cell::RefMut<'_, FakeState> {
        self.0.borrow_mut()
    }
}

impl TaskApi for FakeApi {
    fn list_tasks(&self, _limit: usize, _updated_after: Option<&str>) -> Result<TasksResponse, ApiError> {
        let mut state = self.0.borrow_mut();
        state.list_calls += 1;
        if let Some(error) = state.list_error {
            return Err(error());
        }
        Ok(state.response.clone())
    }

    fn create_task(&self, task: &NewTask) -> Result<CreatedTask, ApiError> {
        let mut state = self.0.borrow_mut();
        if state.fail_writes {
            return Err(ApiError::Api {
                status: 500,
                message: "boom".to_string(),
            });
        }
        state.created.push(task.clone());
        Ok(CreatedTask {
            data: CreatedTaskData {
                id: Some(format!("new-{}", state.created.len())),
            },
        })
    }

    fn close_task(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.0.borrow_mut();
        if state.fail_writes {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        state.closed.push(id.to_string());
        state.response.data.tasks.retain(|t| t.id != id);
        Ok(())
    }
}

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 6)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn test_prefs() -> Preferences {
    Preferences {
        api_key: "test-key".to_string(),
        ..Preferences::default()
    }
}

pub fn session_with(fake: &FakeApi, prefs: Preferences) -> Session {
    let cache = TaskCache::in_memory(prefs.cache_ttl);
    let fake = fake.clone();
    Session::with_parts(
        prefs,
        None,
        cache,
        Box::new(move |_key| Ok(Box::new(fake.clone()) as Box<dyn TaskApi>)),
    )
    .with_clock(Box::new(fixed_now))
}

/// `count` tasks titled `Task number {i} with some text`.
pub fn numbered_tasks(count: usize) -> Vec<Task> {
    (0..count)
        .map(|i| Task::new(format!("task-{}", i), format!("Task number {} with some text", i)))
        .collect()
}
