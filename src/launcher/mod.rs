//! Adapter between the launcher host and the task pipeline.

pub mod action;
pub mod activate;
#[cfg(test)]
mod fake;
pub mod handlers;
pub mod items;
pub mod plugin;
pub mod protocol;
pub mod session;

pub use action::Action;
pub use items::{OnActivate, ResultItem};
pub use session::Session;

use crate::api::ApiError;
use crate::api::morgen::ClientInitError;

#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error("No Morgen API key configured")]
    MissingApiKey,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Client(#[from] ClientInitError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Strip the plugin keyword from the front of a host query.
///
/// `"mg  report"` with keyword `mg` yields `"report"`; a query that does not
/// start with the keyword is returned trimmed.
pub fn strip_keyword<'a>(query: &'a str, keyword: &str) -> &'a str {
    let query = query.trim();
    let (head, rest) = match query.find(char::is_whitespace) {
        Some(i) => (&query[..i], &query[i..]),
        None => (query, ""),
    };
    if head.eq_ignore_ascii_case(keyword) {
        rest.trim()
    } else {
        query
    }
}
