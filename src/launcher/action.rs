use serde::{Deserialize, Serialize};

use crate::core::containers::ContainerKind;

/// Work to perform when a result is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    CreateTask {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        due: Option<String>,
        #[serde(default)]
        priority: i64,
    },
    CompleteTask {
        id: String,
        title: String,
    },
    ShowList {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ContainerKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        list_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    CreateDummyTasks {
        count: usize,
        title_prefix: String,
    },
    CompleteDummyTasks {
        title_prefix: String,
    },
    DumpTaskFields,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTask { .. } => "create_task",
            Self::CompleteTask { .. } => "complete_task",
            Self::ShowList { .. } => "show_list",
            Self::CreateDummyTasks { .. } => "create_dummy_tasks",
            Self::CompleteDummyTasks { .. } => "complete_dummy_tasks",
            Self::DumpTaskFields => "dump_task_fields",
        }
    }
}
