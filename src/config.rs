use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_TTL_SECS;

pub const APP_NAME: &str = "morgen-tasks";
pub const CONFIG_PATH_ENV: &str = "MORGEN_TASKS_CONFIG";
pub const API_KEY_ENV: &str = "MORGEN_API_KEY";

const DEFAULT_KEYWORD: &str = "mg";
const DEFAULT_DUE_TIME: &str = "09:00";
const DEFAULT_MAX_RESULTS: usize = 15;

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.json"))
}

pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_NAME).join("tasks_cache.json"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid preferences in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// User preferences, read from `config.json`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct Preferences {
    pub api_key: String,
    /// Seconds; numeric strings are accepted, anything else means the default.
    #[serde(deserialize_with = "lenient_ttl")]
    pub cache_ttl: u64,
    pub keyword: String,
    /// `HH:MM` used when a due date has no time.
    pub default_due_time: String,
    pub max_results: usize,
    pub dev_tools: bool,
    pub debug_logging: bool,
    pub cache_path: Option<PathBuf>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            cache_ttl: DEFAULT_TTL_SECS,
            keyword: DEFAULT_KEYWORD.to_string(),
            default_due_time: DEFAULT_DUE_TIME.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            dev_tools: false,
            debug_logging: false,
            cache_path: None,
        }
    }
}

impl Preferences {
    /// Config file location: `$MORGEN_TASKS_CONFIG`, else
    /// `~/.config/morgen-tasks/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_PATH_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(default_config_path)
    }

    /// Load from `path` (defaults when absent or broken) and apply
    /// `$MORGEN_API_KEY`.
    pub fn load(path: Option<&Path>) -> Self {
        let mut prefs = match path {
            Some(path) => Self::load_from(path).unwrap_or_else(|e| {
                log::warn!("{}; using default preferences", e);
                Self::default()
            }),
            None => Self::default(),
        };
        prefs.override_api_key(std::env::var(API_KEY_ENV).ok());
        prefs
    }

    /// A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A non-blank key replaces the configured one.
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.api_key = key;
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.trim()).filter(|k| !k.is_empty())
    }

    pub fn keyword(&self) -> &str {
        match self.keyword.trim() {
            "" => DEFAULT_KEYWORD,
            k => k,
        }
    }

    pub fn default_due_time(&self) -> NaiveTime {
        NaiveTime::parse_from_str(self.default_due_time.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(DEFAULT_DUE_TIME, "%H:%M"))
            .unwrap_or(NaiveTime::MIN)
    }

    pub fn max_results(&self) -> usize {
        self.max_results.max(1)
    }

    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache_path.clone().or_else(default_cache_path)
    }
}

fn lenient_ttl<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let ttl = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(ttl.unwrap_or(DEFAULT_TTL_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Preferences {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_object_is_all_defaults() {
        let prefs = parse("{}");
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.cache_ttl, 600);
        assert_eq!(prefs.keyword(), "mg");
        assert_eq!(prefs.api_key(), None);
        assert_eq!(prefs.max_results(), 15);
    }

    #[test]
    fn ttl_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse(r#"{"cache_ttl": 120}"#).cache_ttl, 120);
        assert_eq!(parse(r#"{"cache_ttl": "300"}"#).cache_ttl, 300);
        assert_eq!(parse(r#"{"cache_ttl": "soon"}"#).cache_ttl, 600);
        assert_eq!(parse(r#"{"cache_ttl": -5}"#).cache_ttl, 600);
        assert_eq!(parse(r#"{"cache_ttl": null}"#).cache_ttl, 600);
    }

    #[test]
    fn default_due_time_falls_back() {
        assert_eq!(
            parse(r#"{"default_due_time": "17:30"}"#).default_due_time(),
            NaiveTime::from_hms_opt(17, 30, 0).unwrap()
        );
        assert_eq!(
            parse(r#"{"default_due_time": "teatime"}"#).default_due_time(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn env_key_wins_when_present() {
        let mut prefs = parse(r#"{"api_key": "from-file"}"#);
        prefs.override_api_key(None);
        assert_eq!(prefs.api_key(), Some("from-file"));
        prefs.override_api_key(Some("  ".to_string()));
        assert_eq!(prefs.api_key(), Some("from-file"));
        prefs.override_api_key(Some("from-env".to_string()));
        assert_eq!(prefs.api_key(), Some("from-env"));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert_eq!(Preferences::load_from(&missing).unwrap(), Preferences::default());

        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_key": "k", "keyword": "todo", "dev_tools": true}"#).unwrap();
        let prefs = Preferences::load_from(&path).unwrap();
        assert_eq!(prefs.keyword(), "todo");
        assert!(prefs.dev_tools);

        std::fs::write(&path, "{broken").unwrap();
        assert!(matches!(Preferences::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn explicit_cache_path() {
        let prefs = parse(r#"{"cache_path": "/tmp/x.json"}"#);
        assert_eq!(prefs.cache_path(), Some(PathBuf::from("/tmp/x.json")));
    }
}
