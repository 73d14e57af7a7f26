//! Synthetic tasks for exercising search and caching against a real account.

use chrono::{Duration, NaiveDateTime, Timelike};

use super::task::TIMESTAMP_FORMAT;
use crate::api::NewTask;

pub const DEFAULT_DUMMY_TASK_COUNT: usize = 90;
pub const DEFAULT_DUMMY_TITLE_PREFIX: &str = "#dev Testing ";

const PRIORITY_CYCLE: [i64; 4] = [0, 1, 5, 9];

/// Build `count` (at least one) create payloads titled `{prefix}001`,
/// `{prefix}002`, ... with a spread of priorities and due dates around `now`.
pub fn build_dummy_task_specs(count: usize, title_prefix: &str, now: NaiveDateTime) -> Vec<NewTask> {
    let count = count.max(1);
    let base = now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now);

    (1..=count)
        .map(|idx| {
            let idx_i = idx as i64;
            // Every sixth task has no due date.
            let due = (idx % 6 != 0).then(|| {
                let day_offset = (idx_i - 1) % 21 - 5;
                let hour_offset = idx_i * 3 % 24;
                (base + Duration::days(day_offset) + Duration::hours(hour_offset))
                    .format(TIMESTAMP_FORMAT)
                    .to_string()
            });
            NewTask {
                title: format!("{}{:03}", title_prefix, idx),
                description: Some(format!(
                    "Dummy seed task {:03} for local search/cache performance testing.",
                    idx
                )),
                due,
                priority: PRIORITY_CYCLE[(idx - 1) % PRIORITY_CYCLE.len()],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 6)
            .unwrap()
            .and_hms_opt(10, 15, 42)
            .unwrap()
    }

    #[test]
    fn default_batch_shape() {
        let specs = build_dummy_task_specs(DEFAULT_DUMMY_TASK_COUNT, DEFAULT_DUMMY_TITLE_PREFIX, now());
        assert_eq!(specs.len(), 90);
        assert!(specs.iter().all(|s| s.title.starts_with("#dev Testing ")));
        assert_eq!(specs[0].title, "#dev Testing 001");
        assert_eq!(specs[89].title, "#dev Testing 090");
        assert_eq!(specs.iter().filter(|s| s.due.is_none()).count(), 15);
    }

    #[test]
    fn priorities_cycle() {
        let specs = build_dummy_task_specs(8, "x", now());
        let priorities: Vec<i64> = specs.iter().map(|s| s.priority).collect();
        assert_eq!(priorities, vec![0, 1, 5, 9, 0, 1, 5, 9]);
    }

    #[test]
    fn due_offsets_zero_seconds() {
        let specs = build_dummy_task_specs(6, "x", now());
        // idx 1: -5 days, +3 hours
        assert_eq!(specs[0].due.as_deref(), Some("2026-02-01T13:15:00"));
        // idx 2: -4 days, +6 hours
        assert_eq!(specs[1].due.as_deref(), Some("2026-02-02T16:15:00"));
        assert_eq!(specs[5].due, None);
        assert!(specs.iter().filter_map(|s| s.due.as_ref()).all(|d| d.len() == 19));
    }

    #[test]
    fn count_is_clamped_to_one() {
        let specs = build_dummy_task_specs(0, "x", now());
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].title, "x001");
        assert_eq!(
            specs[0].description.as_deref(),
            Some("Dummy seed task 001 for local search/cache performance testing.")
        );
    }
}
