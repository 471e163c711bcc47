use std::sync::{PoisonError, RwLock};

use storage::models::{Participant, UserId};
use tracing::warn;

/// The signed-in user as known to the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub display_name: String,
}

impl Identity {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    pub fn as_participant(&self) -> Participant {
        Participant::new(self.id, self.display_name.clone())
    }
}

/// Supplies identity and credential to the mutator and the remote client.
///
/// Authentication itself lives outside this crate; the only callback is
/// `invalidate`, raised when the server rejects the credential.
pub trait SessionContext: Send + Sync {
    fn identity(&self) -> Option<Identity>;

    fn bearer_token(&self) -> Option<String>;

    fn invalidate(&self);
}

/// A session whose identity and token are fixed at startup.
pub struct StaticSession {
    identity: Identity,
    token: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn new(identity: Identity, token: Option<String>) -> Self {
        Self {
            identity,
            token: RwLock::new(token),
        }
    }
}

impl SessionContext for StaticSession {
    fn identity(&self) -> Option<Identity> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|_| self.identity.clone())
    }

    fn bearer_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn invalidate(&self) {
        let mut token = self.token.write().unwrap_or_else(PoisonError::into_inner);
        if token.take().is_some() {
            warn!(user = %self.identity.id, "Session invalidated, sign in again");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_clears_credential_and_identity() {
        let session = StaticSession::new(Identity::new(UserId(4), "Nadia"), Some("t0k".into()));
        assert_eq!(session.bearer_token().as_deref(), Some("t0k"));
        assert_eq!(session.identity().map(|i| i.id), Some(UserId(4)));

        session.invalidate();
        assert!(session.bearer_token().is_none());
        assert!(session.identity().is_none());
    }

    #[test]
    fn test_identity_as_participant() {
        let p = Identity::new(UserId(9), "Omar").as_participant();
        assert_eq!(p, Participant::new(UserId(9), "Omar"));
    }
}
