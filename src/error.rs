use std::fmt;

use thiserror::Error;

/// Failures of the server-side task collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(String),
    #[error("title is required")]
    BlankTitle,
}

/// Handle of one in-flight client action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub(crate) u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("task {0} not found")]
    NotFound(String),
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("title is required")]
    BlankTitle,
    #[error("task {0} is not on the board")]
    UnknownTask(String),
    #[error("task {0} has not been acknowledged by the server yet")]
    Unsynced(String),
    #[error("action {0} is not pending")]
    NotPending(Ticket),
    #[error("action {0} was confirmed with a response for a different request")]
    MismatchedConfirmation(Ticket),
}

/// Failures reading or writing the local task cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed cache data: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
}
