//! Merges the primary table and the bank tables into one filterable application list.
//!
//! Bank tables are fetched concurrently and degrade independently: a failing bank source is
//! logged and contributes no rows. Only a failure of the primary table aborts the load.
//!
//! Pagination is offset-based over a sort by `submittedAt`. Applications sharing a timestamp may
//! change order between requests, and rows written between two page requests can shift page
//! boundaries; the hosted store offers no snapshot to page against.

use std::collections::{BTreeMap, HashMap};

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationSource, ApplicationStatus, BankCode, BankTable,
};
use super::status::normalize_status;
use super::transform::{bank_view, to_view_model};
use crate::store::row::text;
use crate::store::{fetch_all, Collection, RecordStore, Row, StoreError};
use crate::users::{Role, User};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Optional status and free-text filters applied before pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<String>,
    #[serde(alias = "searchText")]
    pub search: Option<String>,
}

impl ApplicationFilter {
    fn status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty())
    }

    fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|search| search.trim().to_lowercase())
            .filter(|search| !search.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPage {
    pub items: Vec<Application>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Users keyed for resolving the free-text agent recorded on an application.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    users: Vec<User>,
}

impl AgentDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn from_rows(rows: &[Row]) -> Self {
        let users = rows
            .iter()
            .filter_map(|row| match User::from_row(row) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable user profile");
                    None
                }
            })
            .collect();
        Self { users }
    }

    pub fn find(&self, agent: &str) -> Option<&User> {
        self.users.iter().find(|user| user.matches_agent(agent))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }
}

/// Which applications a signed-in user may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationScope {
    All,
    SubmittedBy(User),
}

impl ApplicationScope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::Agent => ApplicationScope::SubmittedBy(user.clone()),
            Role::Admin | Role::Moderator | Role::Encoder => ApplicationScope::All,
        }
    }

    pub fn permits(&self, application: &Application) -> bool {
        match self {
            ApplicationScope::All => true,
            ApplicationScope::SubmittedBy(user) => {
                user.matches_agent(&application.agent)
                    || user.matches_agent(&application.submitted_by)
            }
        }
    }
}

/// Applications from every source plus the user directory, loaded together.
#[derive(Debug, Clone, Default)]
pub struct ApplicationSnapshot {
    pub applications: Vec<Application>,
    pub directory: AgentDirectory,
}

impl ApplicationSnapshot {
    pub fn scoped(&self, scope: &ApplicationScope) -> Vec<Application> {
        self.applications
            .iter()
            .filter(|application| scope.permits(application))
            .cloned()
            .collect()
    }
}

/// Filters, sorts newest first, and slices one page. `page` is 1-based; 0 is read as 1.
pub fn list_applications(
    applications: &[Application],
    directory: &AgentDirectory,
    filter: &ApplicationFilter,
    page: usize,
    page_size: usize,
) -> ApplicationPage {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let status = filter.status();
    let search = filter.search();

    let mut matching: Vec<&Application> = applications
        .iter()
        .filter(|application| {
            status.map_or(true, |status| {
                application.status.label().eq_ignore_ascii_case(status)
            })
        })
        .filter(|application| {
            search.as_deref().map_or(true, |needle| {
                search_haystack(application, directory).contains(needle)
            })
        })
        .collect();

    matching.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

    let total = matching.len();
    let items = matching
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .cloned()
        .collect();

    ApplicationPage {
        items,
        total,
        page,
        page_size,
    }
}

/// Lower-cased text searched by the free-text filter.
fn search_haystack(application: &Application, directory: &AgentDirectory) -> String {
    let mut parts = vec![
        application.applicant_name(),
        application.agent.clone(),
        application.submitted_by.clone(),
        application.agent_bank_code.clone(),
    ];

    let agent = directory
        .find(&application.agent)
        .or_else(|| directory.find(&application.submitted_by));
    if let Some(user) = agent {
        parts.push(user.name.clone());
        parts.push(user.email.clone());
        for assignment in &user.bank_codes {
            parts.push(assignment.code.clone());
            parts.push(assignment.bank.display_name().to_string());
            parts.push(assignment.bank.key().to_string());
        }
    }

    parts.join("\n").to_lowercase()
}

/// Totals per status. Every status is present, including zero counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub by_status: BTreeMap<ApplicationStatus, usize>,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = ApplicationStatus>) -> Self {
        let mut by_status: BTreeMap<ApplicationStatus, usize> = ApplicationStatus::ordered()
            .into_iter()
            .map(|status| (status, 0))
            .collect();
        let mut total = 0;
        for status in statuses {
            *by_status.entry(status).or_default() += 1;
            total += 1;
        }
        Self { total, by_status }
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

pub fn dashboard_counts(applications: &[Application]) -> StatusCounts {
    StatusCounts::tally(applications.iter().map(|application| application.status))
}

/// One partner bank's view: statuses from its own table and how many applicants asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankStatusSummary {
    pub bank: BankCode,
    pub display_name: &'static str,
    pub requested: usize,
    pub statuses: StatusCounts,
}

pub fn bank_report(applications: &[Application]) -> Vec<BankStatusSummary> {
    BankCode::ordered()
        .into_iter()
        .map(|bank| {
            let table = bank.table();
            let requested = applications
                .iter()
                .filter(|application| application.source == ApplicationSource::Primary)
                .filter(|application| application.bank_preferences.requested(bank))
                .count();
            let statuses = StatusCounts::tally(
                applications
                    .iter()
                    .filter(|application| application.source == ApplicationSource::Bank(table))
                    .map(|application| application.status),
            );
            BankStatusSummary {
                bank,
                display_name: bank.display_name(),
                requested,
                statuses,
            }
        })
        .collect()
}

/// Attaches normalized `bank_status` rows to the primary applications they reference.
pub fn attach_bank_statuses(applications: &mut [Application], rows: &[Row]) {
    let mut by_application: HashMap<ApplicationId, BTreeMap<BankCode, ApplicationStatus>> =
        HashMap::new();

    for row in rows {
        let raw_id = text(row, "application_id");
        let raw_id = raw_id.trim();
        if raw_id.is_empty() {
            continue;
        }
        let Some(bank) = BankCode::from_name(&text(row, "bank")) else {
            tracing::debug!(application_id = raw_id, "bank status row names an unknown bank");
            continue;
        };
        let id = primary_id(raw_id);
        let status = normalize_status(Some(&text(row, "status")));
        by_application.entry(id).or_default().insert(bank, status);
    }

    for application in applications
        .iter_mut()
        .filter(|application| application.source == ApplicationSource::Primary)
    {
        if let Some(statuses) = by_application.remove(&application.id) {
            application.bank_statuses = statuses;
        }
    }
}

fn primary_id(raw_id: &str) -> ApplicationId {
    let prefixed = ApplicationId(raw_id.to_string());
    match prefixed.split() {
        Some((ApplicationSource::Primary, _)) => prefixed,
        _ => ApplicationId::new(ApplicationSource::Primary, raw_id),
    }
}

/// Fetches every source concurrently and converts rows into application views.
pub async fn load_snapshot<S>(store: &S, batch_size: usize) -> Result<ApplicationSnapshot, StoreError>
where
    S: RecordStore + ?Sized,
{
    let bank_fetches = join_all(BankTable::ordered().into_iter().map(|table| async move {
        let rows = fetch_all(store, Collection::Bank(table), batch_size).await;
        (table, rows)
    }));

    let (primary, statuses, users, banks) = futures::join!(
        fetch_all(store, Collection::KycDetails, batch_size),
        fetch_all(store, Collection::BankStatus, batch_size),
        fetch_all(store, Collection::UserProfiles, batch_size),
        bank_fetches,
    );

    let primary = primary?;
    let mut applications: Vec<Application> = primary
        .iter()
        .filter_map(|row| convert(to_view_model(row, Collection::KycDetails.name())))
        .collect();

    match statuses {
        Ok(rows) => attach_bank_statuses(&mut applications, &rows),
        Err(err) => degraded(Collection::BankStatus, &err),
    }

    for (table, rows) in banks {
        match rows {
            Ok(rows) => applications.extend(
                rows.iter()
                    .filter_map(|row| convert(bank_view(table, row))),
            ),
            Err(err) => degraded(Collection::Bank(table), &err),
        }
    }

    let directory = match users {
        Ok(rows) => AgentDirectory::from_rows(&rows),
        Err(err) => {
            degraded(Collection::UserProfiles, &err);
            AgentDirectory::default()
        }
    };

    tracing::debug!(applications = applications.len(), "application snapshot loaded");
    Ok(ApplicationSnapshot {
        applications,
        directory,
    })
}

fn convert<E: std::fmt::Display>(result: Result<Application, E>) -> Option<Application> {
    match result {
        Ok(application) => Some(application),
        Err(err) => {
            tracing::warn!(error = %err, "skipping unreadable application row");
            None
        }
    }
}

fn degraded(collection: Collection, err: &StoreError) {
    tracing::warn!(
        collection = collection.name(),
        error = %err,
        "source unavailable, continuing without it"
    );
}
