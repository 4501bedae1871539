//! Error mapping guide:
//! - Validation, configuration, trigger, discovery and timeout failures exit 1.
//! - Cancellation (SIGINT/SIGTERM while waiting) exits 130.
//! - Transient HTTP/parse failures use `Http`/`Client` and are logged by the loops, never fatal.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CiError {
    /// Missing or malformed command-line input.
    #[error("{0}")]
    Validation(String),

    #[error("Unexpected URL format. Should be 'http://<domain>/.../projects/<project-id>/...': {0}")]
    BadBaseUrl(String),

    #[error("trigger endpoint unreachable: {0}")]
    TriggerUnreachable(String),

    #[error("trigger rejected with status {status}")]
    TriggerRejected { status: String },

    #[error("Cannot detect if build has started.")]
    NoBuildsDetected,

    #[error("gave up waiting after {waited}; still pending: {pending}")]
    PollTimeout { waited: String, pending: String },

    #[error("cancelled")]
    Cancelled,

    /// Non-success HTTP status from the build API.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Transport or decoding failure talking to the build API.
    #[error("{0}")]
    Client(String),
}

impl From<reqwest::Error> for CiError {
    fn from(e: reqwest::Error) -> Self {
        CiError::Client(e.to_string())
    }
}

impl From<serde_json::Error> for CiError {
    fn from(e: serde_json::Error) -> Self {
        CiError::Client(format!("invalid JSON: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, CiError>;

/// Map a CiError to a process exit code.
pub fn exit_code_for_error(e: &CiError) -> u8 {
    match e {
        CiError::Cancelled => 130,
        _ => 1,
    }
}
