//! Which list, project or space a task belongs to.
//!
//! The task payload is not consistent across integrations, so container
//! identity is derived best-effort and list UX is only offered when an id or
//! name can be found.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::task::{Task, TasksResponse, scalar_to_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    List,
    Project,
    Space,
}

impl ContainerKind {
    /// Resolution order for embedded container objects.
    pub const ALL: [ContainerKind; 3] = [Self::List, Self::Project, Self::Space];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Project => "project",
            Self::Space => "space",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Project => "Project",
            Self::Space => "Space",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "list" | "lists" => Some(Self::List),
            "project" | "projects" => Some(Self::Project),
            "space" | "spaces" => Some(Self::Space),
            _ => None,
        }
    }
}

/// Reference to the container a task belongs to. All fields absent means
/// no container information was available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListRef {
    pub kind: Option<ContainerKind>,
    pub list_id: Option<String>,
    pub name: Option<String>,
}

impl TaskListRef {
    /// Stable grouping key: `{kind}:id:{id}`, else `{kind}:name:{lowercased name}`.
    pub fn key(&self) -> Option<String> {
        let kind = self.kind.map(|k| k.as_str()).unwrap_or("unknown");
        if let Some(id) = &self.list_id {
            return Some(format!("{}:id:{}", kind, id));
        }
        self.name
            .as_ref()
            .map(|name| format!("{}:name:{}", kind, name.trim().to_lowercase()))
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.list_id.as_deref())
            .unwrap_or("Unnamed")
    }
}

/// `id -> name` lookups per container kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerNameMaps {
    lists: HashMap<String, String>,
    projects: HashMap<String, String>,
    spaces: HashMap<String, String>,
}

impl ContainerNameMaps {
    pub fn get(&self, kind: ContainerKind, id: &str) -> Option<&str> {
        self.for_kind(kind).get(id).map(String::as_str)
    }

    pub fn insert(&mut self, kind: ContainerKind, id: impl Into<String>, name: impl Into<String>) {
        self.for_kind_mut(kind).insert(id.into(), name.into());
    }

    pub fn for_kind(&self, kind: ContainerKind) -> &HashMap<String, String> {
        match kind {
            ContainerKind::List => &self.lists,
            ContainerKind::Project => &self.projects,
            ContainerKind::Space => &self.spaces,
        }
    }

    fn for_kind_mut(&mut self, kind: ContainerKind) -> &mut HashMap<String, String> {
        match kind {
            ContainerKind::List => &mut self.lists,
            ContainerKind::Project => &mut self.projects,
            ContainerKind::Space => &mut self.spaces,
        }
    }
}

/// Collect container names from `data.lists`, `data.taskLists`,
/// `data.tasklists`, `data.projects` and `data.spaces`. Entries without both a
/// non-empty id and name are skipped.
pub fn build_container_name_maps(response: &TasksResponse) -> ContainerNameMaps {
    let mut maps = ContainerNameMaps::default();
    let sources = [
        ("lists", ContainerKind::List),
        ("taskLists", ContainerKind::List),
        ("tasklists", ContainerKind::List),
        ("projects", ContainerKind::Project),
        ("spaces", ContainerKind::Space),
    ];

    for (field, kind) in sources {
        let Some(Value::Array(items)) = response.data.extra.get(field) else {
            continue;
        };
        for item in items {
            let Value::Object(obj) = item else {
                continue;
            };
            let id = obj.get("id").and_then(scalar_to_string);
            let name = obj.get("name").and_then(scalar_to_string);
            if let (Some(id), Some(name)) = (id, name) {
                maps.insert(kind, id, name);
            }
        }
    }
    maps
}

/// Resolve a task's container, first match wins:
/// 1. embedded `list`, `project`, `space` objects with an id or name
/// 2. flat `taskListId` (kind `list`)
/// 3. `integrationId` (kind `list`, never named)
pub fn get_task_list_ref(task: &Task, maps: &ContainerNameMaps) -> TaskListRef {
    for kind in ContainerKind::ALL {
        let embedded = match kind {
            ContainerKind::List => task.list.as_ref(),
            ContainerKind::Project => task.project.as_ref(),
            ContainerKind::Space => task.space.as_ref(),
        };
        let Some(Value::Object(obj)) = embedded else {
            continue;
        };
        let list_id = obj.get("id").and_then(scalar_to_string);
        let mut name = obj.get("name").and_then(scalar_to_string);
        if list_id.is_none() && name.is_none() {
            continue;
        }
        if name.is_none() {
            if let Some(id) = &list_id {
                name = maps.get(kind, id).map(str::to_string);
            }
        }
        return TaskListRef {
            kind: Some(kind),
            list_id,
            name,
        };
    }

    if let Some(list_id) = task.task_list_id.as_ref().and_then(scalar_to_string) {
        let name = maps
            .get(ContainerKind::List, &list_id)
            .map(str::to_string)
            .or_else(|| {
                task.task_list_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
            });
        return TaskListRef {
            kind: Some(ContainerKind::List),
            list_id: Some(list_id),
            name,
        };
    }

    if let Some(integration_id) = task.integration_id.as_ref().and_then(scalar_to_string) {
        return TaskListRef {
            kind: Some(ContainerKind::List),
            list_id: Some(integration_id),
            name: None,
        };
    }

    TaskListRef::default()
}

/// Count tasks per container, sorted by kind, then name, larger groups first
/// on ties. Tasks without a resolvable container are left out.
pub fn group_tasks_by_list(tasks: &[Task], maps: &ContainerNameMaps) -> Vec<(TaskListRef, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(TaskListRef, usize)> = Vec::new();

    for task in tasks {
        let list_ref = get_task_list_ref(task, maps);
        let Some(key) = list_ref.key() else {
            continue;
        };
        match index.get(&key) {
            Some(&i) => groups[i].1 += 1,
            None => {
                index.insert(key, groups.len());
                groups.push((list_ref, 1));
            }
        }
    }

    groups.sort_by(|(a, a_count), (b, b_count)| {
        let a_name = a.name.as_deref().unwrap_or("").trim().to_lowercase();
        let b_name = b.name.as_deref().unwrap_or("").trim().to_lowercase();
        a.kind
            .cmp(&b.kind)
            .then(a_name.cmp(&b_name))
            .then(b_count.cmp(a_count))
    });
    groups
}

/// Case-insensitive equality, or `input` contained in `name`.
pub fn matches_list_name(name: &str, input: &str) -> bool {
    let name = name.trim().to_lowercase();
    let input = input.trim().to_lowercase();
    if name.is_empty() || input.is_empty() {
        return false;
    }
    name == input || name.contains(&input)
}

/// Case-insensitive exact match; ids are never substring-matched.
pub fn matches_container_id(container_id: &str, input: &str) -> bool {
    let id = container_id.trim();
    let input = input.trim();
    !id.is_empty() && !input.is_empty() && id.to_lowercase() == input.to_lowercase()
}
