use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel recorded as the agent when an applicant submits without an agent.
pub const DIRECT_AGENT: &str = "direct";

/// Identifier for an application, prefixed by its source collection (`kyc-123`, `maybank-45`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn new(source: ApplicationSource, raw_id: &str) -> Self {
        Self(format!("{}-{}", source.prefix(), raw_id))
    }

    /// Splits the identifier back into its source and the store's own row id.
    pub fn split(&self) -> Option<(ApplicationSource, &str)> {
        let (prefix, raw_id) = self.0.split_once('-')?;
        if raw_id.is_empty() {
            return None;
        }
        let source = if prefix == PRIMARY_PREFIX {
            ApplicationSource::Primary
        } else {
            ApplicationSource::Bank(BankTable::from_name(prefix)?)
        };
        Some((source, raw_id))
    }
}

const PRIMARY_PREFIX: &str = "kyc";

/// Collection an application view was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSource {
    Primary,
    Bank(BankTable),
}

impl ApplicationSource {
    pub const fn prefix(self) -> &'static str {
        match self {
            ApplicationSource::Primary => PRIMARY_PREFIX,
            ApplicationSource::Bank(table) => table.table_name(),
        }
    }
}

/// Partner banks an applicant can request, keyed the way bank preferences are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BankCode {
    Rcbc,
    Metrobank,
    EastWestBank,
    Bpi,
    Pnb,
    RobinsonBank,
    Maybank,
    Aub,
}

impl BankCode {
    pub const fn ordered() -> [BankCode; 8] {
        [
            BankCode::Rcbc,
            BankCode::Metrobank,
            BankCode::EastWestBank,
            BankCode::Bpi,
            BankCode::Pnb,
            BankCode::RobinsonBank,
            BankCode::Maybank,
            BankCode::Aub,
        ]
    }

    /// Preference key used in view models.
    pub const fn key(self) -> &'static str {
        match self {
            BankCode::Rcbc => "rcbc",
            BankCode::Metrobank => "metrobank",
            BankCode::EastWestBank => "eastWestBank",
            BankCode::Bpi => "bpi",
            BankCode::Pnb => "pnb",
            BankCode::RobinsonBank => "robinsonBank",
            BankCode::Maybank => "maybank",
            BankCode::Aub => "aub",
        }
    }

    /// Name written into the comma-joined preference column.
    pub fn canonical_name(self) -> &'static str {
        self.aliases()[0]
    }

    /// Lower-case spellings recognised in legacy preference lists. The first entry is canonical.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            BankCode::Rcbc => &["rcbc"],
            BankCode::Metrobank => &["metrobank", "metro bank"],
            BankCode::EastWestBank => &["eastwestbank", "eastwest", "east west bank", "east west"],
            BankCode::Bpi => &["bpi"],
            BankCode::Pnb => &["pnb"],
            BankCode::RobinsonBank => &["robinsons", "robinsonbank", "robinsons bank", "robinson"],
            BankCode::Maybank => &["maybank"],
            BankCode::Aub => &["aub"],
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            BankCode::Rcbc => "RCBC",
            BankCode::Metrobank => "Metrobank",
            BankCode::EastWestBank => "EastWest Bank",
            BankCode::Bpi => "BPI",
            BankCode::Pnb => "PNB",
            BankCode::RobinsonBank => "Robinsons Bank",
            BankCode::Maybank => "Maybank",
            BankCode::Aub => "AUB",
        }
    }

    pub const fn table(self) -> BankTable {
        match self {
            BankCode::Rcbc => BankTable::Rcbc,
            BankCode::Metrobank => BankTable::Metrobank,
            BankCode::EastWestBank => BankTable::Eastwest,
            BankCode::Bpi => BankTable::Bpi,
            BankCode::Pnb => BankTable::Pnb,
            BankCode::RobinsonBank => BankTable::Robinsons,
            BankCode::Maybank => BankTable::Maybank,
            BankCode::Aub => BankTable::Aub,
        }
    }

    /// Resolves a preference key, table name, or alias, ignoring case.
    pub fn from_name(value: &str) -> Option<Self> {
        let lowered = value.trim().to_lowercase();
        BankCode::ordered().into_iter().find(|code| {
            code.key().eq_ignore_ascii_case(&lowered)
                || code.table().table_name() == lowered
                || code.aliases().contains(&lowered.as_str())
        })
    }
}

/// Per-bank collections in the hosted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankTable {
    Maybank,
    Bpi,
    Rcbc,
    Metrobank,
    Eastwest,
    Pnb,
    Aub,
    Robinsons,
}

impl BankTable {
    pub const fn ordered() -> [BankTable; 8] {
        [
            BankTable::Maybank,
            BankTable::Bpi,
            BankTable::Rcbc,
            BankTable::Metrobank,
            BankTable::Eastwest,
            BankTable::Pnb,
            BankTable::Aub,
            BankTable::Robinsons,
        ]
    }

    pub const fn table_name(self) -> &'static str {
        match self {
            BankTable::Maybank => "maybank",
            BankTable::Bpi => "bpi",
            BankTable::Rcbc => "rcbc",
            BankTable::Metrobank => "metrobank",
            BankTable::Eastwest => "eastwest",
            BankTable::Pnb => "pnb",
            BankTable::Aub => "aub",
            BankTable::Robinsons => "robinsons",
        }
    }

    pub const fn bank_code(self) -> BankCode {
        match self {
            BankTable::Maybank => BankCode::Maybank,
            BankTable::Bpi => BankCode::Bpi,
            BankTable::Rcbc => BankCode::Rcbc,
            BankTable::Metrobank => BankCode::Metrobank,
            BankTable::Eastwest => BankCode::EastWestBank,
            BankTable::Pnb => BankCode::Pnb,
            BankTable::Aub => BankCode::Aub,
            BankTable::Robinsons => BankCode::RobinsonBank,
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        BankTable::ordered()
            .into_iter()
            .find(|table| table.table_name().eq_ignore_ascii_case(trimmed))
    }
}

/// Standard status categories plus the bank-specific extensions surfaced as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Unknown,
    Incomplete,
    InProcess,
    Existing,
}

impl ApplicationStatus {
    pub const fn ordered() -> [ApplicationStatus; 8] {
        [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
            ApplicationStatus::Cancelled,
            ApplicationStatus::Unknown,
            ApplicationStatus::Incomplete,
            ApplicationStatus::InProcess,
            ApplicationStatus::Existing,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
            ApplicationStatus::Unknown => "unknown",
            ApplicationStatus::Incomplete => "incomplete",
            ApplicationStatus::InProcess => "in_process",
            ApplicationStatus::Existing => "existing",
        }
    }

    /// Only produced by bank status derivation.
    pub const fn is_bank_extension(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Incomplete
                | ApplicationStatus::InProcess
                | ApplicationStatus::Existing
        )
    }

    pub fn from_label(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        ApplicationStatus::ordered()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(trimmed))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalDetails {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub suffix: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub gender: String,
    pub civil_status: String,
    pub nationality: String,
    pub mobile_number: String,
    pub home_phone: String,
    pub email_address: String,
    pub sss_number: String,
    pub tin_number: String,
    pub dependents: String,
}

/// Name of a relative stored as `"Last, First Middle Suffix"` in the primary table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelativeName {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub barangay: String,
    pub city: String,
    pub zip_code: String,
    pub province: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpouseDetails {
    #[serde(flatten)]
    pub name: RelativeName,
    pub mobile_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalReference {
    #[serde(flatten)]
    pub name: RelativeName,
    pub relationship: String,
    pub mobile_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusinessAddress {
    pub street: String,
    pub barangay: String,
    pub city: String,
    pub zip_code: String,
    pub unit_floor: String,
    pub building_tower: String,
    pub lot_no: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkDetails {
    pub company_name: String,
    pub profession: String,
    pub nature_of_business: String,
    pub position: String,
    pub years_in_business: String,
    pub monthly_income: String,
    pub annual_income: String,
    pub office_phone: String,
    pub address: BusinessAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreditCardDetails {
    pub bank_institution: String,
    pub card_number: String,
    pub credit_limit: String,
    pub member_since: String,
    pub expiration_date: String,
    pub deliver_card_to: String,
    pub best_time_to_contact: String,
}

/// Which partner banks the applicant asked to be submitted to. Every bank is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankPreferences(BTreeMap<BankCode, bool>);

impl Default for BankPreferences {
    fn default() -> Self {
        Self(
            BankCode::ordered()
                .into_iter()
                .map(|code| (code, false))
                .collect(),
        )
    }
}

impl BankPreferences {
    pub fn only(code: BankCode) -> Self {
        let mut preferences = Self::default();
        preferences.set(code, true);
        preferences
    }

    pub fn set(&mut self, code: BankCode, requested: bool) {
        self.0.insert(code, requested);
    }

    pub fn requested(&self, code: BankCode) -> bool {
        self.0.get(&code).copied().unwrap_or(false)
    }

    pub fn selected(&self) -> impl Iterator<Item = BankCode> + '_ {
        BankCode::ordered()
            .into_iter()
            .filter(move |code| self.requested(*code))
    }

    pub fn any_selected(&self) -> bool {
        self.selected().next().is_some()
    }
}

/// Normalized view of one credit-card application regardless of the collection it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub source: ApplicationSource,
    #[serde(default)]
    pub personal_details: PersonalDetails,
    #[serde(default)]
    pub mother_details: RelativeName,
    #[serde(default)]
    pub permanent_address: Address,
    #[serde(default)]
    pub spouse_details: SpouseDetails,
    #[serde(default)]
    pub personal_reference: PersonalReference,
    #[serde(default)]
    pub work_details: WorkDetails,
    #[serde(default)]
    pub credit_card_details: CreditCardDetails,
    #[serde(default)]
    pub bank_preferences: BankPreferences,
    /// Per-bank statuses reported for primary applications.
    #[serde(default)]
    pub bank_statuses: BTreeMap<BankCode, ApplicationStatus>,
    pub status: ApplicationStatus,
    pub agent: String,
    pub submitted_by: String,
    #[serde(default)]
    pub agent_bank_code: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub remarks: String,
}

impl Application {
    pub fn applicant_name(&self) -> String {
        let details = &self.personal_details;
        [
            details.first_name.as_str(),
            details.middle_name.as_str(),
            details.last_name.as_str(),
            details.suffix.as_str(),
        ]
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn is_direct(&self) -> bool {
        self.agent.eq_ignore_ascii_case(DIRECT_AGENT)
    }
}

/// Payload accepted when an applicant or agent files a new application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub personal_details: PersonalDetails,
    pub mother_details: RelativeName,
    pub permanent_address: Address,
    pub spouse_details: SpouseDetails,
    pub personal_reference: PersonalReference,
    pub work_details: WorkDetails,
    pub credit_card_details: CreditCardDetails,
    pub bank_preferences: BankPreferences,
    pub remarks: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_id_round_trips_source_prefix() {
        let id = ApplicationId::new(ApplicationSource::Bank(BankTable::Maybank), "45");
        assert_eq!(id.0, "maybank-45");
        assert_eq!(
            id.split(),
            Some((ApplicationSource::Bank(BankTable::Maybank), "45"))
        );

        let primary = ApplicationId("kyc-9f1c-22".to_string());
        assert_eq!(
            primary.split(),
            Some((ApplicationSource::Primary, "9f1c-22"))
        );
        assert_eq!(ApplicationId("citibank-1".to_string()).split(), None);
        assert_eq!(ApplicationId("kyc-".to_string()).split(), None);
    }

    #[test]
    fn bank_code_resolves_keys_tables_and_aliases() {
        assert_eq!(BankCode::from_name("eastWestBank"), Some(BankCode::EastWestBank));
        assert_eq!(BankCode::from_name("EASTWEST"), Some(BankCode::EastWestBank));
        assert_eq!(BankCode::from_name("robinsons"), Some(BankCode::RobinsonBank));
        assert_eq!(BankCode::from_name(" Metro Bank "), Some(BankCode::Metrobank));
        assert_eq!(BankCode::from_name("citibank"), None);
    }

    #[test]
    fn bank_preferences_serialize_with_view_model_keys() {
        let preferences = BankPreferences::only(BankCode::EastWestBank);
        let value = serde_json::to_value(&preferences).expect("serialize");
        assert_eq!(value["eastWestBank"], true);
        assert_eq!(value["robinsonBank"], false);
        assert_eq!(value.as_object().map(|map| map.len()), Some(8));
    }

    #[test]
    fn status_labels_parse_case_insensitively() {
        assert_eq!(
            ApplicationStatus::from_label("In_Process"),
            Some(ApplicationStatus::InProcess)
        );
        assert_eq!(ApplicationStatus::from_label("done"), None);
        assert!(ApplicationStatus::Existing.is_bank_extension());
        assert!(!ApplicationStatus::Cancelled.is_bank_extension());
    }

    #[test]
    fn applicant_name_skips_blank_parts() {
        let mut details = PersonalDetails::default();
        details.first_name = "Juan".to_string();
        details.last_name = " Cruz ".to_string();
        let application = Application {
            id: ApplicationId("kyc-1".to_string()),
            source: ApplicationSource::Primary,
            personal_details: details,
            mother_details: RelativeName::default(),
            permanent_address: Address::default(),
            spouse_details: SpouseDetails::default(),
            personal_reference: PersonalReference::default(),
            work_details: WorkDetails::default(),
            credit_card_details: CreditCardDetails::default(),
            bank_preferences: BankPreferences::default(),
            bank_statuses: BTreeMap::new(),
            status: ApplicationStatus::Pending,
            agent: "DIRECT".to_string(),
            submitted_by: String::new(),
            agent_bank_code: String::new(),
            submitted_at: DateTime::<Utc>::default(),
            remarks: String::new(),
        };
        assert_eq!(application.applicant_name(), "Juan Cruz");
        assert!(application.is_direct());
    }
}
