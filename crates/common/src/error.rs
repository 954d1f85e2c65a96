use thiserror::Error;

/// Common error types used across the watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

/// Field-less tag of a [`WatchError`], carried in poll results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Parse,
    Config,
    Auth,
}

impl WatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WatchError::Network(_) => ErrorKind::Network,
            WatchError::Parse(_) => ErrorKind::Parse,
            WatchError::Config(_) => ErrorKind::Config,
            WatchError::Auth(_) => ErrorKind::Auth,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Parse => write!(f, "parse"),
            ErrorKind::Config => write!(f, "config"),
            ErrorKind::Auth => write!(f, "auth"),
        }
    }
}
