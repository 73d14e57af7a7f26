//! Plain-text search and the narrowing pipeline shared by list and done mode.

use chrono::NaiveDateTime;

use super::containers::{ContainerNameMaps, get_task_list_ref, matches_container_id, matches_list_name};
use super::filters::matches_task_filters;
use super::query::{ContainerFilter, ListQuery};
use super::task::Task;

/// Every whitespace-separated word of `text` must occur, case-insensitively,
/// in the title or description. Empty text matches everything.
pub fn matches_search_text(task: &Task, text: &str) -> bool {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return true;
    }
    let title = task.title.as_deref().unwrap_or("");
    let haystack = format!("{} {}", title, task.description_text()).to_lowercase();
    words.iter().all(|w| haystack.contains(w.as_str()))
}

/// Whether `task` lives in the container named (or identified) by `filter`.
/// Tasks without container info never match. An `id:` filter ignores names.
pub fn matches_container_filter(task: &Task, filter: &ContainerFilter, maps: &ContainerNameMaps) -> bool {
    let list_ref = get_task_list_ref(task, maps);
    if list_ref.key().is_none() {
        return false;
    }
    if let Some(kind) = filter.kind {
        if list_ref.kind != Some(kind) {
            return false;
        }
    }
    let by_id = list_ref
        .list_id
        .as_deref()
        .is_some_and(|id| matches_container_id(id, &filter.value));
    if filter.by_id {
        return by_id;
    }
    let by_name = list_ref
        .name
        .as_deref()
        .is_some_and(|name| matches_list_name(name, &filter.value));
    by_name || by_id
}

/// Container filter, then structured filters, then text search. Order of
/// `tasks` is kept.
pub fn narrow_tasks<'a>(
    tasks: &'a [Task],
    query: &ListQuery,
    maps: &ContainerNameMaps,
    now: NaiveDateTime,
) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| {
            query
                .container
                .as_ref()
                .is_none_or(|c| matches_container_filter(t, c, maps))
        })
        .filter(|t| matches_task_filters(t, &query.filters, now))
        .filter(|t| matches_search_text(t, &query.search))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::containers::ContainerKind;
    use crate::core::query::parse_list_query;
    use chrono::NaiveDate;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 7)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn task(value: serde_json::Value) -> Task {
        serde_json::from_value(value).unwrap()
    }

    fn synthetic(count: usize) -> Vec<Task> {
        (0..count)
            .map(|i| {
                let mut t = Task::new(format!("task-{}", i), format!("Task number {} with some text", i));
                t.description = Some(format!("Description for task {}", i));
                t.priority = Some([0, 1, 5, 9][i % 4]);
                t
            })
            .collect()
    }

    #[test]
    fn words_are_anded_across_title_and_description() {
        let mut t = Task::new("t1", "Quarterly report");
        t.description = Some("Send to finance".to_string());
        assert!(matches_search_text(&t, "report FINANCE"));
        assert!(matches_search_text(&t, ""));
        assert!(!matches_search_text(&t, "report marketing"));
    }

    #[test]
    fn untitled_placeholder_is_not_searchable() {
        let t = Task::new("t1", "");
        assert_eq!(t.display_title(), "Untitled");
        assert!(!matches_search_text(&t, "untitled"));
        assert!(matches_search_text(&Task::new("t2", "Untitled draft"), "untitled"));
    }

    #[test]
    fn search_across_five_hundred_tasks() {
        let tasks = synthetic(500);
        let query = parse_list_query("number 42");
        let hits = narrow_tasks(&tasks, &query, &ContainerNameMaps::default(), now());
        assert!(hits.iter().any(|t| t.id == "task-42"));
        for hit in &hits {
            let text = format!("{} {}", hit.display_title(), hit.description_text()).to_lowercase();
            assert!(text.contains("number") && text.contains("42"));
        }
        // 42, 142, 242, 342, 420-429, 442
        assert_eq!(hits.len(), 15);
    }

    #[test]
    fn filters_combine_with_search() {
        let tasks = synthetic(20);
        let query = parse_list_query("p:high number 1");
        let hits: Vec<&str> = narrow_tasks(&tasks, &query, &ContainerNameMaps::default(), now())
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(hits, vec!["task-1", "task-13", "task-17"]);
    }

    #[test]
    fn container_filter_by_name_and_id() {
        let tasks = vec![
            task(json!({"id": "a", "title": "Draft", "project": {"id": "p1", "name": "Work Stuff"}})),
            task(json!({"id": "b", "title": "Draft", "taskListId": "l1", "taskListName": "Home"})),
            task(json!({"id": "c", "title": "Draft"})),
        ];
        let maps = ContainerNameMaps::default();

        let hits = narrow_tasks(&tasks, &parse_list_query("in work draft"), &maps, now());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");

        let hits = narrow_tasks(&tasks, &parse_list_query("in L1"), &maps, now());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");

        let hits = narrow_tasks(&tasks, &parse_list_query("list work"), &maps, now());
        assert!(hits.is_empty());
    }

    #[test]
    fn container_filter_respects_kind() {
        let t = task(json!({"id": "a", "space": {"id": "s1", "name": "Personal"}}));
        let maps = ContainerNameMaps::default();
        let space = ContainerFilter {
            kind: Some(ContainerKind::Space),
            value: "pers".to_string(),
            by_id: false,
        };
        let project = ContainerFilter {
            kind: Some(ContainerKind::Project),
            value: "pers".to_string(),
            by_id: false,
        };
        assert!(matches_container_filter(&t, &space, &maps));
        assert!(!matches_container_filter(&t, &project, &maps));
    }

    #[test]
    fn id_filter_ignores_overlapping_names() {
        let tasks = vec![
            task(json!({"id": "a", "title": "A", "taskListId": "l1", "taskListName": "Work"})),
            task(json!({"id": "b", "title": "B", "project": {"id": "p1", "name": "Work Stuff"}})),
            task(json!({"id": "c", "title": "C", "taskListId": "l2", "taskListName": "Homework"})),
            task(json!({"id": "d", "title": "D", "taskListId": "work"})),
        ];
        let maps = ContainerNameMaps::default();

        let hits = narrow_tasks(&tasks, &parse_list_query("list work"), &maps, now());
        assert_eq!(hits.len(), 3);

        let hits: Vec<&str> = narrow_tasks(&tasks, &parse_list_query("list id:l1"), &maps, now())
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(hits, vec!["a"]);
    }
}
