use chrono::NaiveDateTime;
use std::path::PathBuf;

use super::LauncherError;
use crate::api::morgen::{ClientInitError, MorgenClient};
use crate::api::{ApiError, TaskApi};
use crate::cache::TaskCache;
use crate::config::Preferences;
use crate::core::date_parser::DateParser;

/// How many tasks to request per fetch; the API caps this at 100.
pub const FETCH_LIMIT: usize = 100;

pub type ApiFactory = Box<dyn Fn(&str) -> Result<Box<dyn TaskApi>, ClientInitError>>;
pub type Clock = Box<dyn Fn() -> NaiveDateTime>;

/// How current the tasks in the cache are after a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataState {
    Fresh,
    /// The API could not be reached; the last snapshot is shown instead.
    Stale { reason: String },
}

/// Plugin state that lives for the whole launcher process.
pub struct Session {
    prefs: Preferences,
    config_path: Option<PathBuf>,
    cache: TaskCache,
    api: Option<Box<dyn TaskApi>>,
    /// Key the current client was built with.
    api_key: Option<String>,
    api_factory: ApiFactory,
    clock: Clock,
}

impl Session {
    /// Session backed by the real Morgen client and the on-disk cache.
    pub fn new(prefs: Preferences, config_path: Option<PathBuf>) -> Self {
        let cache = TaskCache::new(prefs.cache_ttl, prefs.cache_path());
        let factory: ApiFactory =
            Box::new(|key| MorgenClient::new(key).map(|client| Box::new(client) as Box<dyn TaskApi>));
        Self::with_parts(prefs, config_path, cache, factory)
    }

    pub fn with_parts(
        prefs: Preferences,
        config_path: Option<PathBuf>,
        cache: TaskCache,
        api_factory: ApiFactory,
    ) -> Self {
        crate::set_debug_logging(prefs.debug_logging);
        Self {
            prefs,
            config_path,
            cache,
            api: None,
            api_key: None,
            api_factory,
            clock: Box::new(|| chrono::Local::now().naive_local()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TaskCache {
        &mut self.cache
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn date_parser(&self) -> DateParser {
        DateParser::new(self.prefs.default_due_time())
    }

    /// Re-read the config file so edits apply without restarting the host.
    pub fn reload_preferences(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        let prefs = Preferences::load(Some(path));
        if prefs != self.prefs {
            log::debug!("Preferences changed");
            self.set_preferences(prefs);
        }
    }

    pub fn set_preferences(&mut self, prefs: Preferences) {
        self.cache.set_ttl(prefs.cache_ttl);
        crate::set_debug_logging(prefs.debug_logging);
        self.prefs = prefs;
    }

    /// The API client for the configured key, built on first use and rebuilt
    /// whenever the key changes.
    pub fn api(&mut self) -> Result<&dyn TaskApi, LauncherError> {
        let key = self
            .prefs
            .api_key()
            .ok_or(LauncherError::MissingApiKey)?
            .to_string();
        if self.api.is_none() || self.api_key.as_deref() != Some(key.as_str()) {
            log::info!("Initializing Morgen API client");
            self.api = Some((self.api_factory)(&key)?);
            self.api_key = Some(key);
        }
        match &self.api {
            Some(api) => Ok(api.as_ref()),
            None => Err(LauncherError::MissingApiKey),
        }
    }

    /// Make sure the cache holds something to show.
    ///
    /// Serves a fresh cache as-is, otherwise fetches. When the API is rate
    /// limited or unreachable the last snapshot is kept and reported stale;
    /// every other failure is returned.
    pub fn ensure_tasks(&mut self, force_refresh: bool) -> Result<DataState, LauncherError> {
        if force_refresh {
            log::info!("Force refresh requested");
            self.cache.invalidate();
        }
        if self.cache.get_tasks().is_some() {
            return Ok(DataState::Fresh);
        }

        let fetched = self.api()?.list_tasks(FETCH_LIMIT, None);
        match fetched {
            Ok(response) => {
                self.cache.set_tasks(response);
                Ok(DataState::Fresh)
            }
            Err(e) if e.is_transient() && self.cache.get_full_response().is_some() => {
                log::warn!("Serving cached tasks: {}", e);
                Ok(DataState::Stale {
                    reason: stale_reason(&e).to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub fn stale_reason(error: &ApiError) -> &'static str {
    match error {
        ApiError::RateLimit { .. } => "Rate limited",
        ApiError::Network(_) => "Offline",
        _ => "API unavailable",
    }
}
