use std::fmt;
use ticker_api::client::ApiError;

/// Engine-side failure taxonomy. Stale responses are not represented here:
/// they are discarded silently by the orchestrator, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Network failure, timeout, or an unparseable payload.
    Transport(String),
    /// The backend answered with a 4xx/5xx.
    Rejected { status: u16, message: String },
    /// Local form validation; never reaches the network.
    Validation {
        field: &'static str,
        message: String,
    },
    /// The auto-import retry budget for a round is exhausted. Persists
    /// until the operator re-triggers the round.
    ImportExhausted { round: String },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Transport(msg) => write!(f, "transport error: {msg}"),
            SyncError::Rejected { status, message } => {
                write!(f, "rejected ({status}): {message}")
            }
            SyncError::Validation { field, message } => {
                write!(f, "invalid {field}: {message}")
            }
            SyncError::ImportExhausted { round } => {
                write!(f, "no data available for {round} after import attempts")
            }
        }
    }
}

impl From<ApiError> for SyncError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Network(err, url) => SyncError::Transport(format!("{url}: {err}")),
            ApiError::Parsing(err, url) => SyncError::Transport(format!("{url}: {err}")),
            ApiError::Rejected(status, url) => SyncError::Rejected {
                status: status.as_u16(),
                message: url,
            },
            ApiError::Other(msg) => SyncError::Transport(msg),
        }
    }
}
