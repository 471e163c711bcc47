use storage::MatchupError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Matchup(#[from] MatchupError),

    #[error("Request conflicted with a concurrent change: {0}")]
    Conflict(String),

    #[error("Credential rejected by the server")]
    Unauthorized,

    #[error("Not found on the server: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("{0} is not implemented by the server")]
    NotImplemented(&'static str),

    #[error("No active session")]
    NoSession,

    #[error("Matchup view is no longer attached")]
    Detached,
}

impl ClientError {
    /// Text shown to the user when an action fails.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Matchup(MatchupError::Validation(msg)) if msg.trim().is_empty() => {
                "The server rejected the request. Please check the details and try again."
                    .to_string()
            }
            ClientError::Matchup(MatchupError::Validation(msg)) => msg.clone(),
            ClientError::Matchup(MatchupError::CapacityExceeded(_)) => {
                "This matchup is already full.".to_string()
            }
            ClientError::Matchup(MatchupError::InvalidState(_)) => {
                "This matchup is closed.".to_string()
            }
            ClientError::Matchup(MatchupError::Permission { .. }) => {
                "Only the creator can close this matchup.".to_string()
            }
            ClientError::Matchup(MatchupError::AlreadyParticipant { .. }) => {
                "You are already participating in this matchup.".to_string()
            }
            ClientError::Matchup(MatchupError::NotParticipant { .. }) => {
                "You are not participating in this matchup.".to_string()
            }
            ClientError::Matchup(MatchupError::NotFound(_)) | ClientError::NotFound(_) => {
                "This matchup could not be found.".to_string()
            }
            ClientError::Matchup(MatchupError::Malformed(_)) | ClientError::ParseError(_) => {
                "Received an unexpected response from the server.".to_string()
            }
            ClientError::Conflict(_) => {
                "Failed to join matchup. It might be full or you may already be a participant."
                    .to_string()
            }
            ClientError::Unauthorized | ClientError::NoSession => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ClientError::Network(_) => {
                "Could not reach the server. Please try again.".to_string()
            }
            ClientError::Server { .. } => "Something went wrong. Please try again.".to_string(),
            ClientError::NotImplemented(action) => {
                format!("Sorry, {} is not available yet.", action)
            }
            ClientError::Detached => String::new(),
        }
    }

    /// Whether a read may be retried after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
