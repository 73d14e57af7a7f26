//! TTL cache for the last `/tasks/list` response, persisted as a single JSON
//! snapshot so a fresh launcher process can answer without hitting the API.
//!
//! The list endpoint is expensive against Morgen's rate limit, so the launcher
//! reads through this cache on every keystroke. The cache never fails: disk
//! problems are logged and the cache behaves as if it were empty or unsaved.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::containers::{ContainerNameMaps, build_container_name_maps};
use crate::core::task::{Task, TasksResponse};

pub const DEFAULT_TTL_SECS: u64 = 600;

#[derive(Debug, thiserror::Error)]
enum CacheError {
    #[error("cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache file is not a valid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk layout: `{"timestamp": <epoch secs>, "cache": <response>}`.
#[derive(Serialize, Deserialize)]
struct DiskSnapshot {
    timestamp: f64,
    cache: TasksResponse,
}

#[derive(Debug, Clone)]
struct Snapshot {
    response: TasksResponse,
    /// Seconds since the Unix epoch when the response was stored.
    timestamp: f64,
}

#[derive(Debug)]
pub struct TaskCache {
    ttl: u64,
    cache_path: Option<PathBuf>,
    snapshot: Option<Snapshot>,
    /// Newest `updated` value across cached tasks, a hint for `updatedAfter`.
    last_updated: Option<String>,
}

impl TaskCache {
    /// Create a cache, loading any snapshot already at `cache_path`.
    pub fn new(ttl: u64, cache_path: Option<PathBuf>) -> Self {
        let mut cache = Self {
            ttl,
            cache_path,
            snapshot: None,
            last_updated: None,
        };
        cache.load_from_disk();
        cache
    }

    /// A cache that never touches the filesystem.
    pub fn in_memory(ttl: u64) -> Self {
        Self::new(ttl, None)
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: u64) {
        self.ttl = ttl;
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Cached tasks if a snapshot exists and is younger than the TTL.
    pub fn get_tasks(&self) -> Option<&[Task]> {
        let Some(snapshot) = &self.snapshot else {
            log::debug!("Cache miss: empty");
            return None;
        };
        let age = self.get_age();
        if !self.is_fresh() {
            log::debug!("Cache expired (age: {:.1}s, TTL: {}s)", age, self.ttl);
            return None;
        }
        let tasks = snapshot.response.tasks();
        log::debug!("Cache hit: {} tasks (age: {:.1}s)", tasks.len(), age);
        Some(tasks)
    }

    /// The last stored response regardless of age, for degraded display.
    pub fn get_full_response(&self) -> Option<&TasksResponse> {
        self.snapshot.as_ref().map(|s| &s.response)
    }

    /// Container id/name lookups from the cached response (empty when none).
    pub fn get_container_name_maps(&self) -> ContainerNameMaps {
        self.get_full_response()
            .map(build_container_name_maps)
            .unwrap_or_default()
    }

    /// Replace the snapshot with `response`, stamped now, and persist it.
    pub fn set_tasks(&mut self, response: TasksResponse) {
        self.store(response, epoch_now());
        log::info!("Cache updated: {} tasks stored", self.task_count());
        self.save_to_disk();
    }

    fn store(&mut self, response: TasksResponse, timestamp: f64) {
        self.last_updated = newest_updated(response.tasks());
        self.snapshot = Some(Snapshot { response, timestamp });
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(epoch_now())
    }

    fn is_fresh_at(&self, now: f64) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|s| now - s.timestamp < self.ttl as f64)
    }

    /// Seconds since the snapshot was stored, 0 when empty.
    pub fn get_age(&self) -> f64 {
        self.age_at(epoch_now())
    }

    fn age_at(&self, now: f64) -> f64 {
        self.snapshot.as_ref().map_or(0.0, |s| now - s.timestamp)
    }

    /// `fresh`, `45s ago`, `2m ago`, `1h ago`, or `expired`.
    pub fn get_age_display(&self) -> String {
        self.age_display_at(epoch_now())
    }

    fn age_display_at(&self, now: f64) -> String {
        if !self.is_fresh_at(now) {
            return "expired".to_string();
        }
        let age = self.age_at(now).max(0.0);
        if age < 10.0 {
            "fresh".to_string()
        } else if age < 60.0 {
            format!("{}s ago", age as u64)
        } else if age < 3600.0 {
            format!("{}m ago", (age / 60.0) as u64)
        } else {
            format!("{}h ago", (age / 3600.0) as u64)
        }
    }

    pub fn task_count(&self) -> usize {
        self.get_full_response().map_or(0, |r| r.tasks().len())
    }

    /// Drop the snapshot and its file. Call after any mutation.
    pub fn invalidate(&mut self) {
        log::info!("Cache invalidated");
        self.snapshot = None;
        self.last_updated = None;
        self.delete_from_disk();
    }

    pub fn get_last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    fn load_from_disk(&mut self) {
        let Some(path) = self.cache_path.clone() else {
            return;
        };
        if !path.exists() {
            return;
        }
        match read_snapshot(&path) {
            Ok(disk) => {
                self.store(disk.cache, disk.timestamp);
                log::info!("Loaded cache from disk: {} tasks", self.task_count());
            }
            Err(e) => log::debug!("Failed to load cache from {}: {}", path.display(), e),
        }
    }

    fn save_to_disk(&self) {
        let (Some(path), Some(snapshot)) = (&self.cache_path, &self.snapshot) else {
            return;
        };
        if let Err(e) = write_snapshot(path, snapshot) {
            log::warn!("Failed to save cache to {}: {}", path.display(), e);
        }
    }

    fn delete_from_disk(&self) {
        let Some(path) = &self.cache_path else {
            return;
        };
        if !path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Failed to delete cache file {}: {}", path.display(), CacheError::from(e));
        }
    }
}

fn read_snapshot(path: &Path) -> Result<DiskSnapshot, CacheError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let disk = DiskSnapshot {
        timestamp: snapshot.timestamp,
        cache: snapshot.response.clone(),
    };
    std::fs::write(path, serde_json::to_string(&disk)?)?;
    Ok(())
}

fn newest_updated(tasks: &[Task]) -> Option<String> {
    tasks
        .iter()
        .filter_map(|t| t.updated.as_deref())
        .filter(|u| !u.is_empty())
        .max()
        .map(str::to_string)
}

fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
