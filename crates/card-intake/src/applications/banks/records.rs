use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::super::domain::{ApplicationStatus, BankTable};
use super::rules::{derive_bank_status, is_true};
use crate::store::row::{deserialize_optional_text, deserialize_text, deserialize_timestamp};
use crate::store::Row;

/// A bank column that may hold a boolean, a number, free text, or null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flag(Option<String>);

impl Flag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_set(&self) -> bool {
        is_true(self.as_str())
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Self::new(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_optional_text(deserializer).map(Flag)
    }
}

impl Serialize for Flag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// Columns every bank table shares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankAccount {
    #[serde(deserialize_with = "deserialize_text")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub client_name: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub bank_code: String,
    #[serde(deserialize_with = "deserialize_text")]
    pub agent_name: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AubRecord {
    #[serde(flatten)]
    pub account: BankAccount,
    pub approved: Flag,
    pub declined: Flag,
    pub incomplete: Flag,
}

/// BPI columns. Robinsons Bank records share the same shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BpiRecord {
    #[serde(flatten)]
    pub account: BankAccount,
    pub approved: Flag,
    pub existing_bpi: Flag,
    pub existing_rbank: Flag,
    pub in_process: Flag,
    pub cancelled: Flag,
    pub denied: Flag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EastwestRecord {
    #[serde(flatten)]
    pub account: BankAccount,
    pub approved: Flag,
    pub cancelled: Flag,
    pub declined: Flag,
    pub pending: Flag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaybankRecord {
    #[serde(flatten)]
    pub account: BankAccount,
    pub approved: Flag,
    pub in_process: Flag,
    pub declined: Flag,
    pub cancelled: Flag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetrobankRecord {
    #[serde(flatten)]
    pub account: BankAccount,
    pub approved: Flag,
    pub declined: Flag,
    pub incomplete: Flag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PnbRecord {
    #[serde(flatten)]
    pub account: BankAccount,
    pub approved: Flag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcbcRecord {
    #[serde(flatten)]
    pub account: BankAccount,
    pub approved: Flag,
    pub incomplete: Flag,
    pub in_process: Flag,
    pub rejected: Flag,
}

/// One application as recorded by a partner bank, tagged by the table it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankRecord {
    Aub(AubRecord),
    Bpi(BpiRecord),
    Eastwest(EastwestRecord),
    Maybank(MaybankRecord),
    Metrobank(MetrobankRecord),
    Pnb(PnbRecord),
    Robinsons(BpiRecord),
    Rcbc(RcbcRecord),
}

impl BankRecord {
    pub fn from_row(table: BankTable, row: &Row) -> Result<Self, serde_json::Error> {
        let value = Value::Object(row.clone());
        Ok(match table {
            BankTable::Aub => BankRecord::Aub(serde_json::from_value(value)?),
            BankTable::Bpi => BankRecord::Bpi(serde_json::from_value(value)?),
            BankTable::Eastwest => BankRecord::Eastwest(serde_json::from_value(value)?),
            BankTable::Maybank => BankRecord::Maybank(serde_json::from_value(value)?),
            BankTable::Metrobank => BankRecord::Metrobank(serde_json::from_value(value)?),
            BankTable::Pnb => BankRecord::Pnb(serde_json::from_value(value)?),
            BankTable::Robinsons => BankRecord::Robinsons(serde_json::from_value(value)?),
            BankTable::Rcbc => BankRecord::Rcbc(serde_json::from_value(value)?),
        })
    }

    pub const fn table(&self) -> BankTable {
        match self {
            BankRecord::Aub(_) => BankTable::Aub,
            BankRecord::Bpi(_) => BankTable::Bpi,
            BankRecord::Eastwest(_) => BankTable::Eastwest,
            BankRecord::Maybank(_) => BankTable::Maybank,
            BankRecord::Metrobank(_) => BankTable::Metrobank,
            BankRecord::Pnb(_) => BankTable::Pnb,
            BankRecord::Robinsons(_) => BankTable::Robinsons,
            BankRecord::Rcbc(_) => BankTable::Rcbc,
        }
    }

    pub fn account(&self) -> &BankAccount {
        match self {
            BankRecord::Aub(record) => &record.account,
            BankRecord::Bpi(record) | BankRecord::Robinsons(record) => &record.account,
            BankRecord::Eastwest(record) => &record.account,
            BankRecord::Maybank(record) => &record.account,
            BankRecord::Metrobank(record) => &record.account,
            BankRecord::Pnb(record) => &record.account,
            BankRecord::Rcbc(record) => &record.account,
        }
    }

    pub fn status(&self) -> ApplicationStatus {
        derive_bank_status(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn from_row_reads_mixed_flag_types() {
        let record = BankRecord::from_row(
            BankTable::Maybank,
            &row(json!({
                "id": 45,
                "client_name": "Reyes Ana",
                "bank_code": "MB-01",
                "agent_name": "agent1",
                "created_at": "2025-02-01T08:00:00+00:00",
                "approved": false,
                "in_process": "Yes",
                "declined": 0,
                "cancelled": null,
            })),
        )
        .expect("maybank row parses");

        let BankRecord::Maybank(maybank) = &record else {
            panic!("expected maybank variant, got {record:?}");
        };
        assert_eq!(maybank.account.id, "45");
        assert_eq!(maybank.approved.as_str(), Some("false"));
        assert!(maybank.in_process.is_set());
        assert_eq!(maybank.declined.as_str(), Some("0"));
        assert_eq!(maybank.cancelled, Flag::default());
        assert!(maybank.account.created_at.is_some());
        assert_eq!(record.table(), BankTable::Maybank);
    }

    #[test]
    fn from_row_defaults_missing_columns() {
        let record = BankRecord::from_row(BankTable::Pnb, &row(json!({ "id": "p-1" })))
            .expect("sparse row parses");
        assert_eq!(record.account().client_name, "");
        assert_eq!(record.account().created_at, None);
        assert_eq!(record.status(), ApplicationStatus::Pending);
    }

    #[test]
    fn robinsons_rows_use_bpi_columns() {
        let record = BankRecord::from_row(
            BankTable::Robinsons,
            &row(json!({ "id": 3, "existing_rbank": "TRUE" })),
        )
        .expect("robinsons row parses");
        assert_eq!(record.table(), BankTable::Robinsons);
        assert_eq!(record.status(), ApplicationStatus::Existing);
    }
}
