use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::banks::BankRecord;
use super::domain::{
    Application, ApplicationId, ApplicationSource, ApplicationStatus, ApplicationSubmission,
    BankPreferences, BankTable, CreditCardDetails, PersonalDetails, SpouseDetails, WorkDetails,
    DIRECT_AGENT,
};
use super::legacy::{
    encode_address, encode_bank_preferences, encode_business_address, encode_personal_reference,
    encode_relative_name, parse_address, parse_bank_preferences, parse_business_address,
    parse_personal_reference, parse_relative_name,
};
use super::status::normalize_status;
use crate::store::row::{parse_timestamp, text};
use crate::store::{Collection, Row};

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("unknown source collection `{0}`")]
    UnknownSource(String),
    #[error("{0} row has no id")]
    MissingId(&'static str),
    #[error("unreadable {table} row: {source}")]
    Row {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Column layout of the primary `kyc_details` table. Every column is read as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KycRow {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
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
    pub mother_maiden_name: String,
    pub permanent_address: String,
    pub spouse_name: String,
    pub spouse_mobile_number: String,
    pub personal_reference: String,
    pub company_name: String,
    pub profession: String,
    pub nature_of_business: String,
    pub position: String,
    pub years_in_business: String,
    pub monthly_income: String,
    pub annual_income: String,
    pub office_phone: String,
    pub business_address: String,
    pub bank_institution: String,
    pub card_number: String,
    pub credit_limit: String,
    pub member_since: String,
    pub expiration_date: String,
    pub deliver_card_to: String,
    pub best_time_to_contact: String,
    pub bank_preferences: String,
    pub status: String,
    pub agent: String,
    pub submitted_by: String,
    pub agent_bank_code: String,
    pub remarks: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_at: String,
}

impl KycRow {
    /// Reads a store row, rendering numbers and booleans as text and nulls as empty strings.
    pub fn from_row(row: &Row) -> Result<Self, serde_json::Error> {
        let textual: Row = row
            .keys()
            .map(|column| (column.clone(), Value::String(text(row, column))))
            .collect();
        serde_json::from_value(Value::Object(textual))
    }

    pub fn into_row(self) -> Row {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => row,
            _ => Row::new(),
        }
    }

    /// Encodes a new submission into the primary table's column layout.
    pub fn from_submission(
        submission: &ApplicationSubmission,
        agent: &str,
        submitted_by: &str,
        agent_bank_code: &str,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let personal = &submission.personal_details;
        let work = &submission.work_details;
        let card = &submission.credit_card_details;

        Self {
            id: String::new(),
            first_name: personal.first_name.trim().to_string(),
            middle_name: personal.middle_name.trim().to_string(),
            last_name: personal.last_name.trim().to_string(),
            suffix: personal.suffix.trim().to_string(),
            date_of_birth: personal.date_of_birth.clone(),
            place_of_birth: personal.place_of_birth.clone(),
            gender: personal.gender.clone(),
            civil_status: personal.civil_status.clone(),
            nationality: personal.nationality.clone(),
            mobile_number: personal.mobile_number.trim().to_string(),
            home_phone: personal.home_phone.clone(),
            email_address: personal.email_address.trim().to_string(),
            sss_number: personal.sss_number.clone(),
            tin_number: personal.tin_number.clone(),
            dependents: personal.dependents.clone(),
            mother_maiden_name: encode_relative_name(&submission.mother_details),
            permanent_address: encode_address(&submission.permanent_address),
            spouse_name: encode_relative_name(&submission.spouse_details.name),
            spouse_mobile_number: submission.spouse_details.mobile_number.trim().to_string(),
            personal_reference: encode_personal_reference(&submission.personal_reference),
            company_name: work.company_name.clone(),
            profession: work.profession.clone(),
            nature_of_business: work.nature_of_business.clone(),
            position: work.position.clone(),
            years_in_business: work.years_in_business.clone(),
            monthly_income: work.monthly_income.clone(),
            annual_income: work.annual_income.clone(),
            office_phone: work.office_phone.clone(),
            business_address: encode_business_address(&work.address),
            bank_institution: card.bank_institution.clone(),
            card_number: card.card_number.clone(),
            credit_limit: card.credit_limit.clone(),
            member_since: card.member_since.clone(),
            expiration_date: card.expiration_date.clone(),
            deliver_card_to: card.deliver_card_to.clone(),
            best_time_to_contact: card.best_time_to_contact.clone(),
            bank_preferences: encode_bank_preferences(&submission.bank_preferences),
            status: ApplicationStatus::Pending.label().to_string(),
            agent: agent.to_string(),
            submitted_by: submitted_by.to_string(),
            agent_bank_code: agent_bank_code.to_string(),
            remarks: submission.remarks.trim().to_string(),
            created_at: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn into_application(self) -> Result<Application, TransformError> {
        if self.id.trim().is_empty() {
            return Err(TransformError::MissingId(Collection::KycDetails.name()));
        }

        let agent = [self.agent.trim(), self.submitted_by.trim()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(DIRECT_AGENT)
            .to_string();
        let status = normalize_status(Some(&self.status));
        let submitted_at = parse_timestamp(&self.created_at).unwrap_or_default();

        let reference = parse_personal_reference(&self.personal_reference);
        let spouse = SpouseDetails {
            name: parse_relative_name(&self.spouse_name),
            mobile_number: self.spouse_mobile_number,
        };

        Ok(Application {
            id: ApplicationId::new(ApplicationSource::Primary, self.id.trim()),
            source: ApplicationSource::Primary,
            personal_details: PersonalDetails {
                first_name: self.first_name,
                middle_name: self.middle_name,
                last_name: self.last_name,
                suffix: self.suffix,
                date_of_birth: self.date_of_birth,
                place_of_birth: self.place_of_birth,
                gender: self.gender,
                civil_status: self.civil_status,
                nationality: self.nationality,
                mobile_number: self.mobile_number,
                home_phone: self.home_phone,
                email_address: self.email_address,
                sss_number: self.sss_number,
                tin_number: self.tin_number,
                dependents: self.dependents,
            },
            mother_details: parse_relative_name(&self.mother_maiden_name),
            permanent_address: parse_address(&self.permanent_address),
            spouse_details: spouse,
            personal_reference: reference,
            work_details: WorkDetails {
                company_name: self.company_name,
                profession: self.profession,
                nature_of_business: self.nature_of_business,
                position: self.position,
                years_in_business: self.years_in_business,
                monthly_income: self.monthly_income,
                annual_income: self.annual_income,
                office_phone: self.office_phone,
                address: parse_business_address(&self.business_address),
            },
            credit_card_details: CreditCardDetails {
                bank_institution: self.bank_institution,
                card_number: self.card_number,
                credit_limit: self.credit_limit,
                member_since: self.member_since,
                expiration_date: self.expiration_date,
                deliver_card_to: self.deliver_card_to,
                best_time_to_contact: self.best_time_to_contact,
            },
            bank_preferences: parse_bank_preferences(&self.bank_preferences),
            bank_statuses: BTreeMap::new(),
            status,
            agent,
            submitted_by: self.submitted_by,
            agent_bank_code: self.agent_bank_code,
            submitted_at,
            remarks: self.remarks,
        })
    }
}

/// Builds the minimal view a bank table holds: name, agent, the one bank, and its derived status.
pub fn bank_application(record: &BankRecord) -> Result<Application, TransformError> {
    let table = record.table();
    let account = record.account();
    let raw_id = account.id.trim();
    if raw_id.is_empty() {
        return Err(TransformError::MissingId(table.table_name()));
    }

    let client_name = account.client_name.trim();
    let (first_name, last_name) = client_name
        .split_once(' ')
        .map(|(first, rest)| (first.to_string(), rest.trim().to_string()))
        .unwrap_or_else(|| (client_name.to_string(), String::new()));

    let agent_name = account.agent_name.trim();
    let agent = if agent_name.is_empty() {
        DIRECT_AGENT.to_string()
    } else {
        agent_name.to_string()
    };

    Ok(Application {
        id: ApplicationId::new(ApplicationSource::Bank(table), raw_id),
        source: ApplicationSource::Bank(table),
        personal_details: PersonalDetails {
            first_name,
            last_name,
            ..PersonalDetails::default()
        },
        mother_details: Default::default(),
        permanent_address: Default::default(),
        spouse_details: SpouseDetails::default(),
        personal_reference: Default::default(),
        work_details: WorkDetails::default(),
        credit_card_details: CreditCardDetails::default(),
        bank_preferences: BankPreferences::only(table.bank_code()),
        bank_statuses: BTreeMap::new(),
        status: record.status(),
        agent,
        submitted_by: agent_name.to_string(),
        agent_bank_code: account.bank_code.trim().to_string(),
        submitted_at: account.created_at.unwrap_or_default(),
        remarks: String::new(),
    })
}

/// Converts a raw row from `kyc_details` or one of the bank tables into an application view.
pub fn to_view_model(row: &Row, source_table: &str) -> Result<Application, TransformError> {
    match Collection::from_name(source_table) {
        Some(Collection::KycDetails) => KycRow::from_row(row)
            .map_err(|source| TransformError::Row {
                table: Collection::KycDetails.name(),
                source,
            })?
            .into_application(),
        Some(Collection::Bank(table)) => bank_view(table, row),
        _ => Err(TransformError::UnknownSource(source_table.to_string())),
    }
}

pub(crate) fn bank_view(table: BankTable, row: &Row) -> Result<Application, TransformError> {
    let record = BankRecord::from_row(table, row).map_err(|source| TransformError::Row {
        table: table.table_name(),
        source,
    })?;
    bank_application(&record)
}
