use reqwest::StatusCode;
use storage::MatchupError;
use storage::models::{MatchupId, UserId};

use crate::ClientError;

/// Remote endpoints, relative to `{base_url}/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    List,
    ListNotFull,
    Fetch(MatchupId),
    Create,
    Join(MatchupId, UserId),
    Close(MatchupId),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::List | Endpoint::Create => "/matchups".to_string(),
            Endpoint::ListNotFull => "/matchups/not-full".to_string(),
            Endpoint::Fetch(id) => format!("/matchups/{}", id),
            Endpoint::Join(id, user) => format!("/matchups/{}/participants/{}", id, user),
            Endpoint::Close(id) => format!("/matchups/{}/close", id),
        }
    }

    /// Idempotent reads; the only requests that may be retried.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Endpoint::List | Endpoint::ListNotFull | Endpoint::Fetch(_)
        )
    }

    fn matchup(&self) -> Option<MatchupId> {
        match self {
            Endpoint::Fetch(id) | Endpoint::Join(id, _) | Endpoint::Close(id) => Some(*id),
            Endpoint::List | Endpoint::ListNotFull | Endpoint::Create => None,
        }
    }
}

/// Pull a human-readable message out of an error body: `{"message": ..}`,
/// `{"error": ..}` or plain text.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(serde_json::Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    body.trim().to_string()
}

/// Map a non-success response to a typed error.
pub(crate) fn classify(
    endpoint: Endpoint,
    status: StatusCode,
    body: &str,
    actor: Option<UserId>,
) -> ClientError {
    let message = error_message(body);

    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => match (endpoint.matchup(), actor) {
            (Some(id), Some(actor)) => MatchupError::Permission { id, actor }.into(),
            _ => ClientError::Server {
                status: status.as_u16(),
                message,
            },
        },
        StatusCode::NOT_FOUND => ClientError::NotFound(if message.is_empty() {
            endpoint.path()
        } else {
            message
        }),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let lowered = message.to_lowercase();
            match endpoint.matchup() {
                Some(id) if lowered.contains("full") => MatchupError::CapacityExceeded(id).into(),
                Some(id) if lowered.contains("closed") => MatchupError::InvalidState(id).into(),
                _ if matches!(endpoint, Endpoint::Join(..)) => ClientError::Conflict(message),
                _ if message.is_empty() => {
                    MatchupError::Validation(format!("{} rejected the request", endpoint.path()))
                        .into()
                }
                _ => MatchupError::Validation(message).into(),
            }
        }
        _ => ClientError::Server {
            status: status.as_u16(),
            message,
        },
    }
}
