use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::aggregator::{
    attach_bank_statuses, bank_report, dashboard_counts, list_applications, load_snapshot,
    ApplicationFilter, ApplicationPage, ApplicationScope, BankStatusSummary, StatusCounts,
};
use super::domain::{
    Application, ApplicationId, ApplicationSource, ApplicationStatus, ApplicationSubmission,
    DIRECT_AGENT,
};
use super::import::{insert_rows, parse_csv, ImportError, ImportSummary};
use super::transform::{to_view_model, KycRow, TransformError};
use super::validation::{validate_submission, ValidationError};
use crate::auth::{IdentityProvider, Session, SessionError};
use crate::store::row::text;
use crate::store::{fetch_all, Collection, RecordStore, Row, StoreError};
use crate::users::{Role, User};

/// Roles allowed to move applications through review and to bulk import.
const REVIEWER_ROLES: &[Role] = &[Role::Admin, Role::Moderator, Role::Encoder];

#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("application {0} not found")]
    NotFound(String),
    #[error("application {0} is owned by its bank and cannot be edited")]
    ReadOnlySource(String),
    #[error("`{0}` cannot be assigned as an application status")]
    InvalidStatus(String),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body accepted when a reviewer changes an application's status.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Dashboard totals and the per-bank report, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub counts: StatusCounts,
    pub banks: Vec<BankStatusSummary>,
}

/// Role-scoped reads and writes over applications from every source.
pub struct ApplicationService<S, I> {
    store: Arc<S>,
    identity: Arc<I>,
    batch_size: usize,
}

impl<S, I> ApplicationService<S, I>
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

    pub async fn list(
        &self,
        session: &Session,
        filter: &ApplicationFilter,
        page: usize,
        page_size: usize,
    ) -> Result<ApplicationPage, ApplicationServiceError> {
        let scope = ApplicationScope::for_user(session.require_user()?);
        let snapshot = load_snapshot(self.store.as_ref(), self.batch_size).await?;
        let visible = snapshot.scoped(&scope);
        Ok(list_applications(
            &visible,
            &snapshot.directory,
            filter,
            page,
            page_size,
        ))
    }

    pub async fn dashboard(&self, session: &Session) -> Result<StatusCounts, ApplicationServiceError> {
        let scope = ApplicationScope::for_user(session.require_user()?);
        let snapshot = load_snapshot(self.store.as_ref(), self.batch_size).await?;
        Ok(dashboard_counts(&snapshot.scoped(&scope)))
    }

    pub async fn bank_report(
        &self,
        session: &Session,
    ) -> Result<Vec<BankStatusSummary>, ApplicationServiceError> {
        session.require_role(REVIEWER_ROLES)?;
        let snapshot = load_snapshot(self.store.as_ref(), self.batch_size).await?;
        Ok(bank_report(&snapshot.applications))
    }

    /// Unscoped totals for operators running the CLI against the store directly.
    pub async fn overview(&self) -> Result<Overview, ApplicationServiceError> {
        let snapshot = load_snapshot(self.store.as_ref(), self.batch_size).await?;
        Ok(Overview {
            counts: dashboard_counts(&snapshot.applications),
            banks: bank_report(&snapshot.applications),
        })
    }

    pub async fn get(
        &self,
        session: &Session,
        id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        let scope = ApplicationScope::for_user(session.require_user()?);
        let not_found = || ApplicationServiceError::NotFound(id.0.clone());
        let (source, raw_id) = id.split().ok_or_else(not_found)?;
        let collection = collection_for(source);

        let row = self
            .store
            .find(collection, raw_id)
            .await?
            .ok_or_else(not_found)?;
        let mut application = to_view_model(&row, collection.name())?;

        if source == ApplicationSource::Primary {
            self.attach_statuses(&mut application, raw_id).await;
        }

        if !scope.permits(&application) {
            return Err(not_found());
        }
        Ok(application)
    }

    /// Files a new application. Agents are recorded as the submitter; everyone else is `direct`.
    pub async fn submit(
        &self,
        session: &Session,
        submission: ApplicationSubmission,
    ) -> Result<Application, ApplicationServiceError> {
        validate_submission(&submission)?;

        let (agent, submitted_by, agent_bank_code) = match session.user() {
            Some(user) if user.role == Role::Agent => (
                agent_label(user),
                user.email.clone(),
                agent_bank_code(user, &submission),
            ),
            Some(user) => (DIRECT_AGENT.to_string(), user.email.clone(), String::new()),
            None => (DIRECT_AGENT.to_string(), String::new(), String::new()),
        };

        let row = KycRow::from_submission(
            &submission,
            &agent,
            &submitted_by,
            &agent_bank_code,
            Utc::now(),
        )
        .into_row();
        let stored = self.store.insert(Collection::KycDetails, row).await?;
        let application = to_view_model(&stored, Collection::KycDetails.name())?;

        tracing::info!(
            application_id = %application.id.0,
            agent = %application.agent,
            banks = application.bank_preferences.selected().count(),
            "application submitted"
        );
        Ok(application)
    }

    pub async fn update_status(
        &self,
        session: &Session,
        id: &ApplicationId,
        change: StatusChange,
    ) -> Result<Application, ApplicationServiceError> {
        let actor = session.require_role(REVIEWER_ROLES)?;
        let (source, raw_id) = id
            .split()
            .ok_or_else(|| ApplicationServiceError::NotFound(id.0.clone()))?;
        if source != ApplicationSource::Primary {
            return Err(ApplicationServiceError::ReadOnlySource(id.0.clone()));
        }

        let status = ApplicationStatus::from_label(&change.status)
            .filter(|status| !status.is_bank_extension() && *status != ApplicationStatus::Unknown)
            .ok_or_else(|| ApplicationServiceError::InvalidStatus(change.status.clone()))?;

        let mut patch = Row::new();
        patch.insert(
            "status".to_string(),
            Value::String(status.label().to_string()),
        );
        if let Some(remarks) = change.remarks {
            patch.insert("remarks".to_string(), Value::String(remarks.trim().to_string()));
        }

        let updated = self
            .store
            .update(Collection::KycDetails, raw_id, patch)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => ApplicationServiceError::NotFound(id.0.clone()),
                other => other.into(),
            })?;
        let mut application = to_view_model(&updated, Collection::KycDetails.name())?;
        self.attach_statuses(&mut application, raw_id).await;

        tracing::info!(
            actor = %actor.id,
            application_id = %id.0,
            status = status.label(),
            "application status updated"
        );
        Ok(application)
    }

    pub async fn import_csv(
        &self,
        session: &Session,
        csv: &str,
    ) -> Result<ImportSummary, ApplicationServiceError> {
        let actor = session.require_role(REVIEWER_ROLES)?;
        tracing::info!(actor = %actor.id, "csv import requested");
        self.import_unchecked(csv).await
    }

    /// Imports without a session, for operators with direct store access.
    pub async fn import_unchecked(&self, csv: &str) -> Result<ImportSummary, ApplicationServiceError> {
        let rows = parse_csv(csv)?;
        Ok(insert_rows(self.store.as_ref(), rows).await)
    }

    async fn attach_statuses(&self, application: &mut Application, raw_id: &str) {
        match fetch_all(self.store.as_ref(), Collection::BankStatus, self.batch_size).await {
            Ok(rows) => {
                let prefixed = application.id.0.as_str();
                let relevant: Vec<Row> = rows
                    .into_iter()
                    .filter(|row| {
                        let referenced = text(row, "application_id");
                        let referenced = referenced.trim();
                        referenced == raw_id || referenced == prefixed
                    })
                    .collect();
                attach_bank_statuses(std::slice::from_mut(application), &relevant);
            }
            Err(err) => {
                tracing::warn!(error = %err, "bank statuses unavailable");
            }
        }
    }
}

const fn collection_for(source: ApplicationSource) -> Collection {
    match source {
        ApplicationSource::Primary => Collection::KycDetails,
        ApplicationSource::Bank(table) => Collection::Bank(table),
    }
}

fn agent_label(user: &User) -> String {
    if user.name.trim().is_empty() {
        user.email.trim().to_string()
    } else {
        user.name.trim().to_string()
    }
}

/// The agent's code with the first requested bank they hold a code for.
fn agent_bank_code(user: &User, submission: &ApplicationSubmission) -> String {
    submission
        .bank_preferences
        .selected()
        .find_map(|bank| {
            user.bank_codes
                .iter()
                .find(|assignment| assignment.bank == bank)
        })
        .map(|assignment| assignment.code.trim().to_string())
        .unwrap_or_default()
}
