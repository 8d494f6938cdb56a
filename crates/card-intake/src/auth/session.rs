use serde::Serialize;

use crate::store::StoreError;
use crate::users::{Role, User};

/// Lifecycle of one caller's session: anonymous, authenticating, authenticated, signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(User),
    SignedOut,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("Forbidden")]
    Forbidden,
    #[error("no user profile is linked to this identity")]
    MissingProfile,
    #[error("cannot {action} a session that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Session {
    pub const fn state_label(&self) -> &'static str {
        match self {
            Session::Anonymous => "anonymous",
            Session::Authenticating => "authenticating",
            Session::Authenticated(_) => "authenticated",
            Session::SignedOut => "signed_out",
        }
    }

    pub fn begin(self) -> Result<Self, SessionError> {
        match self {
            Session::Anonymous | Session::SignedOut => Ok(Session::Authenticating),
            other => Err(other.invalid("begin authenticating")),
        }
    }

    pub fn complete(self, user: User) -> Result<Self, SessionError> {
        match self {
            Session::Authenticating => Ok(Session::Authenticated(user)),
            other => Err(other.invalid("complete")),
        }
    }

    /// Drops a failed sign-in attempt back to anonymous.
    pub fn abandon(self) -> Result<Self, SessionError> {
        match self {
            Session::Authenticating => Ok(Session::Anonymous),
            other => Err(other.invalid("abandon")),
        }
    }

    pub fn sign_out(self) -> Result<Self, SessionError> {
        match self {
            Session::Authenticated(_) => Ok(Session::SignedOut),
            other => Err(other.invalid("sign out")),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn require_user(&self) -> Result<&User, SessionError> {
        self.user().ok_or(SessionError::Unauthenticated)
    }

    pub fn require_role(&self, allowed: &[Role]) -> Result<&User, SessionError> {
        let user = self.require_user()?;
        if allowed.contains(&user.role) {
            Ok(user)
        } else {
            Err(SessionError::Forbidden)
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state_label(),
            user: self.user().cloned(),
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: "u-1".to_string(),
            email: "mod@example.com".to_string(),
            name: "Moderator".to_string(),
            role,
            bank_codes: Vec::new(),
        }
    }

    #[test]
    fn lifecycle_follows_sign_in_and_sign_out() {
        let session = Session::default();
        assert_eq!(session.state_label(), "anonymous");

        let session = session.begin().expect("begin");
        let session = session.complete(user(Role::Moderator)).expect("complete");
        assert_eq!(session.user().map(|user| user.role), Some(Role::Moderator));

        let session = session.sign_out().expect("sign out");
        assert_eq!(session, Session::SignedOut);
        assert!(session.user().is_none());

        let session = session.begin().expect("signed out users can sign in again");
        assert_eq!(session, Session::Authenticating);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        match Session::Anonymous.complete(user(Role::Admin)) {
            Err(SessionError::InvalidTransition { action, state }) => {
                assert_eq!(action, "complete");
                assert_eq!(state, "anonymous");
            }
            other => panic!("expected invalid transition, got {other:?}"),
        }
        assert!(Session::Anonymous.sign_out().is_err());
        assert!(Session::Authenticated(user(Role::Agent)).begin().is_err());
    }

    #[test]
    fn require_role_distinguishes_anonymous_from_forbidden() {
        let anonymous = Session::Anonymous;
        assert!(matches!(
            anonymous.require_role(&[Role::Admin]),
            Err(SessionError::Unauthenticated)
        ));

        let agent = Session::Authenticated(user(Role::Agent));
        assert!(matches!(
            agent.require_role(&[Role::Admin, Role::Moderator]),
            Err(SessionError::Forbidden)
        ));
        assert!(agent.require_role(&[Role::Agent]).is_ok());
    }
}
