use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Value};

use crate::applications::domain::{ApplicationSubmission, BankCode, BankPreferences, BankTable};
use crate::applications::{application_router, ApplicationService};
use crate::store::{Collection, MemoryIdentity, MemoryStore, Row};

pub(super) const ADMIN_TOKEN: &str = "admin-token";
pub(super) const AGENT_TOKEN: &str = "agent-token";
pub(super) const OTHER_AGENT_TOKEN: &str = "other-agent-token";
pub(super) const ENCODER_TOKEN: &str = "encoder-token";

pub(super) type Service = ApplicationService<MemoryStore, MemoryIdentity>;

pub(super) fn row(value: Value) -> Row {
    value.as_object().cloned().expect("row fixture is an object")
}

pub(super) fn submission() -> ApplicationSubmission {
    let mut submission = ApplicationSubmission::default();
    submission.personal_details.first_name = "Maria".to_string();
    submission.personal_details.last_name = "Santos".to_string();
    submission.personal_details.date_of_birth = "1988-02-14".to_string();
    submission.personal_details.mobile_number = "09171234567".to_string();
    submission.personal_details.email_address = "maria.santos@example.com".to_string();
    submission.permanent_address.street = "12 Acacia St".to_string();
    submission.permanent_address.city = "Makati".to_string();
    submission.mother_details.first_name = "Luz".to_string();
    submission.mother_details.last_name = "Reyes".to_string();
    let mut preferences = BankPreferences::only(BankCode::Bpi);
    preferences.set(BankCode::Metrobank, true);
    submission.bank_preferences = preferences;
    submission
}

pub(super) fn invalid_submission() -> ApplicationSubmission {
    let mut submission = submission();
    submission.personal_details.first_name = String::new();
    submission.personal_details.mobile_number = "12345".to_string();
    submission
}

fn register(
    store: &MemoryStore,
    identity: &MemoryIdentity,
    id: &str,
    email: &str,
    name: &str,
    role: &str,
    token: &str,
) {
    identity.register(id, email, token);
    store.seed(
        Collection::UserProfiles,
        [row(json!({
            "id": id,
            "email": email,
            "name": name,
            "role": role,
            "bank_codes": [{ "bank": "bpi", "code": "BPI-0042" }],
        }))],
    );
}

/// Store with one admin, one encoder, two agents, and a spread of applications.
pub(super) fn seeded_backend() -> (Arc<MemoryStore>, Arc<MemoryIdentity>) {
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(MemoryIdentity::new());

    register(&store, &identity, "u-admin", "admin@example.com", "Ada Admin", "admin", ADMIN_TOKEN);
    register(&store, &identity, "u-enc", "encoder@example.com", "Eli Encoder", "encoder", ENCODER_TOKEN);
    register(&store, &identity, "u-agent", "agent@example.com", "Andy Agent", "agent", AGENT_TOKEN);
    register(&store, &identity, "u-other", "other@example.com", "Olga Other", "agent", OTHER_AGENT_TOKEN);

    store.seed(
        Collection::KycDetails,
        [
            row(json!({
                "id": "101",
                "first_name": "Juan",
                "last_name": "Cruz",
                "mobile_number": "09170000001",
                "bank_preferences": "BPI, Metrobank",
                "status": "Approved",
                "agent": "Andy Agent",
                "submitted_by": "agent@example.com",
                "created_at": "2025-03-01T08:00:00Z",
            })),
            row(json!({
                "id": "102",
                "first_name": "Rosa",
                "last_name": "Lim",
                "mobile_number": "09170000002",
                "bank_preferences": "pnb",
                "status": "For Verification",
                "agent": "direct",
                "created_at": "2025-03-02T08:00:00Z",
            })),
        ],
    );
    store.seed(
        Collection::BankStatus,
        [row(json!({ "application_id": "101", "bank": "bpi", "status": "In Process" }))],
    );
    store.seed(
        Collection::Bank(BankTable::Pnb),
        [row(json!({
            "id": 7,
            "client_name": "Pedro Garcia Jr",
            "agent_name": "Olga Other",
            "approved": true,
            "created_at": "2025-03-03T08:00:00Z",
        }))],
    );

    (store, identity)
}

pub(super) fn build_service() -> (Arc<Service>, Arc<MemoryStore>) {
    let (store, identity) = seeded_backend();
    let service = Arc::new(ApplicationService::new(store.clone(), identity, 2));
    (service, store)
}

pub(super) fn build_router() -> (axum::Router, Arc<MemoryStore>) {
    let (service, store) = build_service();
    (application_router(service), store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
