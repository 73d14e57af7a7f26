pub mod containers;
pub mod date_parser;
pub mod dummy;
pub mod filters;
pub mod format;
pub mod query;
pub mod search;
pub mod task;
