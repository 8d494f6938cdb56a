//! Access to the hosted relational store.
//!
//! Rows travel as plain JSON objects; typed views are built in the `applications` and `users`
//! modules. `fetch_all` pages through a collection because the hosted store caps the number of
//! rows returned by a single request.

mod memory;
mod rest;
pub mod row;

use async_trait::async_trait;

use crate::applications::domain::BankTable;

pub use memory::{MemoryIdentity, MemoryStore};
pub use rest::HostedStore;
pub use row::Row;

/// Collections exposed by the hosted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    KycDetails,
    UserProfiles,
    BankStatus,
    Bank(BankTable),
}

impl Collection {
    pub const fn name(self) -> &'static str {
        match self {
            Collection::KycDetails => "kyc_details",
            Collection::UserProfiles => "user_profiles",
            Collection::BankStatus => "bank_status",
            Collection::Bank(table) => table.table_name(),
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim() {
            "kyc_details" => Some(Collection::KycDetails),
            "user_profiles" => Some(Collection::UserProfiles),
            "bank_status" => Some(Collection::BankStatus),
            other => BankTable::from_name(other).map(Collection::Bank),
        }
    }
}

/// Failures reported by the hosted store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("row not found")]
    NotFound,
    #[error("malformed store payload: {0}")]
    Malformed(String),
}

/// Row-level access to store collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_page(
        &self,
        collection: Collection,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError>;

    async fn find(&self, collection: Collection, id: &str) -> Result<Option<Row>, StoreError>;

    /// Inserts a row and returns it as stored, including generated columns.
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError>;

    async fn update(&self, collection: Collection, id: &str, patch: Row)
        -> Result<Row, StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// Reads every row of a collection, `batch_size` rows at a time, until an empty page arrives.
///
/// Hosted stores may cap a page below `batch_size`, so a short page only advances the offset.
pub async fn fetch_all<S>(
    store: &S,
    collection: Collection,
    batch_size: usize,
) -> Result<Vec<Row>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut rows = Vec::new();
    let mut offset = 0;

    loop {
        let page = store.fetch_page(collection, offset, batch_size).await?;
        if page.is_empty() {
            break;
        }
        offset += page.len();
        rows.extend(page);
    }

    tracing::debug!(collection = collection.name(), rows = rows.len(), "fetched collection");
    Ok(rows)
}
