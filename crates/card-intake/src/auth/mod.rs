//! Request-scoped sessions backed by the hosted auth service.

pub mod session;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::store::{Collection, RecordStore, StoreError};
use crate::users::User;

pub use session::{Session, SessionError};

/// Identity record held by the auth service (separate from the profile row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: String,
    pub email: String,
}

/// Auth service operations used for sign-in and user administration.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer token. `Ok(None)` means the token is not valid.
    async fn resolve_token(&self, token: &str) -> Result<Option<AuthIdentity>, StoreError>;

    async fn create_identity(&self, email: &str, password: &str)
        -> Result<AuthIdentity, StoreError>;

    async fn update_identity(
        &self,
        id: &str,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn delete_identity(&self, id: &str) -> Result<(), StoreError>;
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Builds the session for one request. No token yields an anonymous session.
pub async fn authenticate<S, I>(
    store: &S,
    identity: &I,
    token: Option<&str>,
) -> Result<Session, SessionError>
where
    S: RecordStore + ?Sized,
    I: IdentityProvider + ?Sized,
{
    let session = Session::default();
    let Some(token) = token else {
        return Ok(session);
    };

    let session = session.begin()?;
    let Some(resolved) = identity.resolve_token(token).await? else {
        session.abandon()?;
        return Err(SessionError::Unauthenticated);
    };

    let Some(row) = store.find(Collection::UserProfiles, &resolved.id).await? else {
        tracing::warn!(user_id = %resolved.id, "authenticated identity has no profile");
        session.abandon()?;
        return Err(SessionError::MissingProfile);
    };

    let user = User::from_row(&row).map_err(|err| {
        tracing::warn!(user_id = %resolved.id, error = %err, "unreadable user profile");
        SessionError::MissingProfile
    })?;

    session.complete(user)
}
