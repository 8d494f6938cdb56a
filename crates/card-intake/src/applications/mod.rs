//! Credit-card applications from the primary intake table and the partner bank tables.
//!
//! Rows are normalized into [`Application`] views by the transformer, assigned a standard status
//! by the normalizer or the per-bank rules, and merged by the aggregator for listing and
//! dashboards.

pub mod aggregator;
pub mod banks;
pub mod domain;
pub mod import;
pub mod legacy;
pub mod router;
pub mod service;
pub mod status;
pub mod transform;
pub mod validation;

#[cfg(test)]
mod tests;

pub use aggregator::{
    list_applications, load_snapshot, AgentDirectory, ApplicationFilter, ApplicationPage,
    ApplicationScope, ApplicationSnapshot, BankStatusSummary, StatusCounts,
};
pub use banks::{derive_bank_status, derive_status_for, is_true, BankRecord};
pub use domain::{
    Address, Application, ApplicationId, ApplicationSource, ApplicationStatus,
    ApplicationSubmission, BankCode, BankPreferences, BankTable, BusinessAddress,
    CreditCardDetails, PersonalDetails, PersonalReference, RelativeName, SpouseDetails,
    WorkDetails, DIRECT_AGENT,
};
pub use import::{ImportError, ImportSummary};
pub use router::application_router;
pub use service::{ApplicationService, ApplicationServiceError, Overview, StatusChange};
pub use status::normalize_status;
pub use transform::{to_view_model, KycRow, TransformError};
pub use validation::{is_valid_mobile, ValidationError};
