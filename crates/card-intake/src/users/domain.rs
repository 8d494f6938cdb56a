use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::applications::domain::BankCode;
use crate::store::row::deserialize_text;
use crate::store::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Agent,
    Encoder,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Agent => "agent",
            Role::Encoder => "encoder",
        }
    }

    /// Whether an account with this role may create, edit, or delete accounts of `target` role.
    pub const fn can_manage(self, target: Role) -> bool {
        match self {
            Role::Admin => true,
            Role::Moderator => matches!(target, Role::Agent | Role::Encoder),
            Role::Agent | Role::Encoder => false,
        }
    }
}

/// An agent's own reference code with a partner bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankCodeAssignment {
    pub bank: BankCode,
    pub code: String,
}

/// Profile row kept in `user_profiles`, keyed by the auth identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "deserialize_text")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    pub role: Role,
    #[serde(default, alias = "bankCodes", deserialize_with = "deserialize_bank_codes")]
    pub bank_codes: Vec<BankCodeAssignment>,
}

impl User {
    pub fn from_row(row: &Row) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(row.clone()))
    }

    pub fn to_row(&self) -> Row {
        match serde_json::to_value(self) {
            Ok(Value::Object(row)) => row,
            _ => Row::new(),
        }
    }

    /// Whether an application's free-text agent field refers to this user.
    pub fn matches_agent(&self, agent: &str) -> bool {
        let agent = agent.trim();
        if agent.is_empty() {
            return false;
        }
        agent == self.id
            || agent.eq_ignore_ascii_case(self.email.trim())
            || agent.eq_ignore_ascii_case(self.name.trim())
    }
}

/// Null, missing, and malformed entries collapse to an empty or partial list.
fn deserialize_bank_codes<'de, D>(deserializer: D) -> Result<Vec<BankCodeAssignment>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let entries = match value {
        Some(Value::Array(entries)) => entries,
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<BankCodeAssignment>(entry).ok())
        .collect())
}
