use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::row::text;
use super::{Collection, RecordStore, Row, StoreError};
use crate::auth::{AuthIdentity, IdentityProvider};

/// Process-local store used when no hosted store is configured.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Row>>>,
    unavailable: Mutex<HashSet<Collection>>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rows as-is, assigning ids to rows that lack one.
    pub fn seed(&self, collection: Collection, rows: impl IntoIterator<Item = Row>) {
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let table = guard.entry(collection).or_default();
        for row in rows {
            table.push(self.with_id(row));
        }
    }

    /// Makes every request against `collection` fail until restored.
    pub fn set_unavailable(&self, collection: Collection, unavailable: bool) {
        let mut guard = self.unavailable.lock().expect("store mutex poisoned");
        if unavailable {
            guard.insert(collection);
        } else {
            guard.remove(&collection);
        }
    }

    pub fn rows(&self, collection: Collection) -> Vec<Row> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        guard.get(&collection).cloned().unwrap_or_default()
    }

    fn check(&self, collection: Collection) -> Result<(), StoreError> {
        let guard = self.unavailable.lock().expect("store mutex poisoned");
        if guard.contains(&collection) {
            Err(StoreError::Transport(format!(
                "{} is unavailable",
                collection.name()
            )))
        } else {
            Ok(())
        }
    }

    /// Assigns the next numeric id when missing; explicit numeric ids move the sequence past them.
    fn with_id(&self, mut row: Row) -> Row {
        let id = text(&row, "id");
        let id = id.trim();
        if id.is_empty() {
            let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            row.insert("id".to_string(), Value::from(id));
        } else if let Ok(explicit) = id.parse::<u64>() {
            self.sequence.fetch_max(explicit, Ordering::Relaxed);
        }
        row
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_page(
        &self,
        collection: Collection,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        self.check(collection)?;
        let guard = self.collections.lock().expect("store mutex poisoned");
        Ok(guard
            .get(&collection)
            .map(|rows| rows.iter().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn find(&self, collection: Collection, id: &str) -> Result<Option<Row>, StoreError> {
        self.check(collection)?;
        let guard = self.collections.lock().expect("store mutex poisoned");
        Ok(guard
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| text(row, "id") == id))
            .cloned())
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError> {
        self.check(collection)?;
        let row = self.with_id(row);
        let id = text(&row, "id");
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let table = guard.entry(collection).or_default();
        if table.iter().any(|existing| text(existing, "id") == id) {
            return Err(StoreError::Rejected {
                status: 409,
                message: format!("duplicate id {id} in {}", collection.name()),
            });
        }
        table.push(row.clone());
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<Row, StoreError> {
        self.check(collection)?;
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let row = guard
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|row| text(row, "id") == id))
            .ok_or(StoreError::NotFound)?;
        for (column, value) in patch {
            row.insert(column, value);
        }
        Ok(row.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.check(collection)?;
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let rows = guard.get_mut(&collection).ok_or(StoreError::NotFound)?;
        let before = rows.len();
        rows.retain(|row| text(row, "id") != id);
        if rows.len() == before {
            Err(StoreError::NotFound)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    identity: AuthIdentity,
    password: String,
}

/// Process-local auth service: accounts plus issued bearer tokens.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    tokens: Mutex<HashMap<String, String>>,
    sequence: AtomicU64,
    writes_unavailable: AtomicBool,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an existing account and a token that resolves to it.
    pub fn register(&self, id: &str, email: &str, token: &str) {
        self.accounts.lock().expect("identity mutex poisoned").insert(
            id.to_string(),
            Account {
                identity: AuthIdentity {
                    id: id.to_string(),
                    email: email.to_string(),
                },
                password: String::new(),
            },
        );
        self.issue_token(id, token);
    }

    pub fn issue_token(&self, id: &str, token: &str) {
        self.tokens
            .lock()
            .expect("identity mutex poisoned")
            .insert(token.to_string(), id.to_string());
    }

    pub fn identity(&self, id: &str) -> Option<AuthIdentity> {
        self.accounts
            .lock()
            .expect("identity mutex poisoned")
            .get(id)
            .map(|account| account.identity.clone())
    }

    /// Makes account creation, edits, and removal fail until restored. Tokens still resolve.
    pub fn set_writes_unavailable(&self, unavailable: bool) {
        self.writes_unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.writes_unavailable.load(Ordering::Relaxed) {
            Err(StoreError::Transport("auth admin API is unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn password_matches(&self, id: &str, password: &str) -> bool {
        self.accounts
            .lock()
            .expect("identity mutex poisoned")
            .get(id)
            .is_some_and(|account| account.password == password)
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn resolve_token(&self, token: &str) -> Result<Option<AuthIdentity>, StoreError> {
        let id = self
            .tokens
            .lock()
            .expect("identity mutex poisoned")
            .get(token)
            .cloned();
        Ok(id.and_then(|id| self.identity(&id)))
    }

    async fn create_identity(&self, email: &str, password: &str) -> Result<AuthIdentity, StoreError> {
        self.check_writes()?;
        let mut accounts = self.accounts.lock().expect("identity mutex poisoned");
        if accounts
            .values()
            .any(|account| account.identity.email.eq_ignore_ascii_case(email))
        {
            return Err(StoreError::Rejected {
                status: 422,
                message: "a user with this email address has already been registered".to_string(),
            });
        }

        let id = format!("user-{}", self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let identity = AuthIdentity {
            id: id.clone(),
            email: email.to_string(),
        };
        accounts.insert(
            id,
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        Ok(identity)
    }

    async fn update_identity(
        &self,
        id: &str,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut accounts = self.accounts.lock().expect("identity mutex poisoned");
        let account = accounts.get_mut(id).ok_or(StoreError::NotFound)?;
        if let Some(email) = email {
            account.identity.email = email.to_string();
        }
        if let Some(password) = password {
            account.password = password.to_string();
        }
        Ok(())
    }

    async fn delete_identity(&self, id: &str) -> Result<(), StoreError> {
        self.check_writes()?;
        let removed = self
            .accounts
            .lock()
            .expect("identity mutex poisoned")
            .remove(id);
        if removed.is_none() {
            return Err(StoreError::NotFound);
        }
        self.tokens
            .lock()
            .expect("identity mutex poisoned")
            .retain(|_, owner| owner != id);
        Ok(())
    }
}
