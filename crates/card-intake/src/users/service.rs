use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{BankCodeAssignment, Role, User};
use crate::auth::{AuthIdentity, IdentityProvider, Session, SessionError};
use crate::store::{fetch_all, Collection, RecordStore, StoreError};

const MIN_PASSWORD_LEN: usize = 6;
const MANAGER_ROLES: &[Role] = &[Role::Admin, Role::Moderator];

/// Body accepted when creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub bank_codes: Option<Vec<BankCodeAssignment>>,
}

/// Body accepted when editing an account; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub bank_codes: Option<Vec<BankCodeAssignment>>,
}

/// Auth identity plus profile, the shape returned by every mutating admin call.
#[derive(Debug, Clone, Serialize)]
pub struct ManagedUser {
    pub user: AuthIdentity,
    pub profile: User,
}

#[derive(Debug, thiserror::Error)]
pub enum UserAdminError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid fields: {}", .0.join(", "))]
    Invalid(Vec<&'static str>),
    #[error("user {0} not found")]
    NotFound(String),
    #[error("accounts cannot delete themselves")]
    SelfDeletion,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates, edits, and removes accounts, keeping auth identities and profiles in step.
pub struct UserAdminService<S, I> {
    store: Arc<S>,
    identity: Arc<I>,
    batch_size: usize,
}

impl<S, I> UserAdminService<S, I>
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, identity: Arc<I>, batch_size: usize) -> Self {
        Self {
            store,
            identity,
            batch_size,
        }
    }

    pub async fn session(&self, token: Option<&str>) -> Result<Session, SessionError> {
        crate::auth::authenticate(self.store.as_ref(), self.identity.as_ref(), token).await
    }

    pub async fn list(&self, session: &Session) -> Result<Vec<User>, UserAdminError> {
        let actor = session.require_role(MANAGER_ROLES)?;
        let rows = fetch_all(self.store.as_ref(), Collection::UserProfiles, self.batch_size).await?;
        let users = rows
            .iter()
            .filter_map(|row| match User::from_row(row) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable user profile");
                    None
                }
            })
            .filter(|user| actor.role.can_manage(user.role) || user.id == actor.id)
            .collect();
        Ok(users)
    }

    pub async fn create(
        &self,
        session: &Session,
        request: NewUser,
    ) -> Result<ManagedUser, UserAdminError> {
        let actor = session.require_role(MANAGER_ROLES)?;
        if !actor.role.can_manage(request.role) {
            return Err(SessionError::Forbidden.into());
        }

        let mut invalid = Vec::new();
        check_email(&request.email, &mut invalid);
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            invalid.push("password");
        }
        if request.name.trim().is_empty() {
            invalid.push("name");
        }
        if !invalid.is_empty() {
            return Err(UserAdminError::Invalid(invalid));
        }

        let email = request.email.trim().to_string();
        let identity = self
            .identity
            .create_identity(&email, &request.password)
            .await?;

        let profile = User {
            id: identity.id.clone(),
            email,
            name: request.name.trim().to_string(),
            role: request.role,
            bank_codes: bank_codes_for(request.role, request.bank_codes.unwrap_or_default()),
        };

        if let Err(err) = self
            .store
            .insert(Collection::UserProfiles, profile.to_row())
            .await
        {
            tracing::warn!(user_id = %identity.id, error = %err, "profile insert failed, removing identity");
            if let Err(cleanup) = self.identity.delete_identity(&identity.id).await {
                tracing::error!(user_id = %identity.id, error = %cleanup, "orphaned auth identity");
            }
            return Err(err.into());
        }

        tracing::info!(actor = %actor.id, user_id = %profile.id, role = profile.role.label(), "user created");
        Ok(ManagedUser {
            user: identity,
            profile,
        })
    }

    pub async fn update(
        &self,
        session: &Session,
        id: &str,
        update: UserUpdate,
    ) -> Result<ManagedUser, UserAdminError> {
        let actor = session.require_role(MANAGER_ROLES)?;
        let existing = self.load(id).await?;
        let target_role = update.role.unwrap_or(existing.role);
        if !actor.role.can_manage(existing.role) || !actor.role.can_manage(target_role) {
            return Err(SessionError::Forbidden.into());
        }

        let mut invalid = Vec::new();
        if let Some(email) = update.email.as_deref() {
            check_email(email, &mut invalid);
        }
        if let Some(password) = update.password.as_deref() {
            if password.chars().count() < MIN_PASSWORD_LEN {
                invalid.push("password");
            }
        }
        if matches!(update.name.as_deref(), Some(name) if name.trim().is_empty()) {
            invalid.push("name");
        }
        if !invalid.is_empty() {
            return Err(UserAdminError::Invalid(invalid));
        }

        let email = update.email.as_deref().map(str::trim);
        let mut previous = existing.to_row();
        previous.remove("id");

        let bank_codes = update
            .bank_codes
            .unwrap_or_else(|| existing.bank_codes.clone());
        let profile = User {
            id: existing.id.clone(),
            email: email.map(str::to_string).unwrap_or(existing.email),
            name: update
                .name
                .map(|name| name.trim().to_string())
                .unwrap_or(existing.name),
            role: target_role,
            bank_codes: bank_codes_for(target_role, bank_codes),
        };

        let mut patch = profile.to_row();
        patch.remove("id");
        self.store
            .update(Collection::UserProfiles, id, patch)
            .await
            .map_err(|err| not_found_as(err, id))?;

        if email.is_some() || update.password.is_some() {
            if let Err(err) = self
                .identity
                .update_identity(id, email, update.password.as_deref())
                .await
            {
                tracing::warn!(user_id = %id, error = %err, "identity update failed, restoring profile");
                if let Err(restore) = self.store.update(Collection::UserProfiles, id, previous).await {
                    tracing::error!(user_id = %id, error = %restore, "profile no longer matches auth identity");
                }
                return Err(not_found_as(err, id));
            }
        }

        tracing::info!(actor = %actor.id, user_id = %profile.id, "user updated");
        Ok(ManagedUser {
            user: AuthIdentity {
                id: profile.id.clone(),
                email: profile.email.clone(),
            },
            profile,
        })
    }

    pub async fn delete(&self, session: &Session, id: &str) -> Result<ManagedUser, UserAdminError> {
        let actor = session.require_role(MANAGER_ROLES)?;
        if actor.id == id {
            return Err(UserAdminError::SelfDeletion);
        }
        let existing = self.load(id).await?;
        if !actor.role.can_manage(existing.role) {
            return Err(SessionError::Forbidden.into());
        }

        self.store
            .delete(Collection::UserProfiles, id)
            .await
            .map_err(|err| not_found_as(err, id))?;
        match self.identity.delete_identity(id).await {
            Ok(()) | Err(StoreError::NotFound) => {}
            Err(err) => {
                tracing::error!(user_id = %id, error = %err, "orphaned auth identity");
                return Err(err.into());
            }
        }

        tracing::info!(actor = %actor.id, user_id = %id, "user deleted");
        Ok(ManagedUser {
            user: AuthIdentity {
                id: existing.id.clone(),
                email: existing.email.clone(),
            },
            profile: existing,
        })
    }

    async fn load(&self, id: &str) -> Result<User, UserAdminError> {
        let row = self
            .store
            .find(Collection::UserProfiles, id)
            .await?
            .ok_or_else(|| UserAdminError::NotFound(id.to_string()))?;
        User::from_row(&row).map_err(|err| {
            UserAdminError::Store(StoreError::Malformed(format!("user profile {id}: {err}")))
        })
    }
}

fn check_email(email: &str, invalid: &mut Vec<&'static str>) {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        invalid.push("email");
    }
}

/// Bank codes only mean something for agents.
fn bank_codes_for(role: Role, codes: Vec<BankCodeAssignment>) -> Vec<BankCodeAssignment> {
    if role == Role::Agent {
        codes
            .into_iter()
            .filter(|assignment| !assignment.code.trim().is_empty())
            .collect()
    } else {
        Vec::new()
    }
}

fn not_found_as(err: StoreError, id: &str) -> UserAdminError {
    match err {
        StoreError::NotFound => UserAdminError::NotFound(id.to_string()),
        other => UserAdminError::Store(other),
    }
}
