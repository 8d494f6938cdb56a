//! Account administration through the public router: role gates, validation, and the
//! identity/profile pairing every mutation keeps in step.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use serde_json::{json, Value};

    use card_intake::store::{Collection, MemoryIdentity, MemoryStore, Row};
    use card_intake::users::{admin_router, UserAdminService};

    pub(super) const ADMIN_TOKEN: &str = "admin-token";
    pub(super) const MODERATOR_TOKEN: &str = "moderator-token";
    pub(super) const AGENT_TOKEN: &str = "agent-token";

    fn profile(id: &str, email: &str, name: &str, role: &str) -> Row {
        json!({ "id": id, "email": email, "name": name, "role": role })
            .as_object()
            .cloned()
            .expect("object")
    }

    pub(super) fn backend() -> (Arc<MemoryStore>, Arc<MemoryIdentity>) {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentity::new());
        for (id, email, name, role, token) in [
            ("u-admin", "admin@example.com", "Ada", "admin", ADMIN_TOKEN),
            ("u-mod", "mod@example.com", "Mo", "moderator", MODERATOR_TOKEN),
            ("u-agent", "agent@example.com", "Andy", "agent", AGENT_TOKEN),
        ] {
            identity.register(id, email, token);
            store.seed(Collection::UserProfiles, [profile(id, email, name, role)]);
        }
        (store, identity)
    }

    pub(super) fn router(store: Arc<MemoryStore>, identity: Arc<MemoryIdentity>) -> axum::Router {
        admin_router(Arc::new(UserAdminService::new(store, identity, 100)))
    }

    pub(super) fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request")
    }

    pub(super) async fn read_json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }
}

use axum::http::StatusCode;
use card_intake::store::{Collection, RecordStore};
use serde_json::json;
use tower::ServiceExt;

use common::*;

#[tokio::test]
async fn admin_creates_agent_with_bank_codes() {
    let (store, identity) = backend();
    let response = router(store.clone(), identity.clone())
        .oneshot(request(
            "POST",
            "/api/admin/users",
            ADMIN_TOKEN,
            Some(json!({
                "email": "new.agent@example.com",
                "password": "s3cret!",
                "name": "Nina Agent",
                "role": "agent",
                "bank_codes": [{ "bank": "maybank", "code": "MB-77" }, { "bank": "bpi", "code": " " }],
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json_body(response).await;
    let id = body["user"]["id"].as_str().expect("identity id").to_string();
    assert_eq!(body["profile"]["role"], json!("agent"));
    assert_eq!(
        body["profile"]["bank_codes"],
        json!([{ "bank": "maybank", "code": "MB-77" }])
    );

    assert!(identity.password_matches(&id, "s3cret!"));
    let stored = store
        .find(Collection::UserProfiles, &id)
        .await
        .expect("find")
        .expect("profile row");
    assert_eq!(stored["name"], json!("Nina Agent"));
}

#[tokio::test]
async fn moderators_cannot_create_admins() {
    let (store, identity) = backend();
    let response = router(store, identity)
        .oneshot(request(
            "POST",
            "/api/admin/users",
            MODERATOR_TOKEN,
            Some(json!({
                "email": "boss@example.com",
                "password": "s3cret!",
                "name": "Boss",
                "role": "admin",
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json_body(response).await, json!({ "error": "Forbidden" }));
}

#[tokio::test]
async fn agents_cannot_reach_admin_routes() {
    let (store, identity) = backend();
    let response = router(store, identity)
        .oneshot(request("GET", "/api/admin/users", AGENT_TOKEN, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_and_duplicate_accounts_are_bad_requests() {
    let (store, identity) = backend();
    let response = router(store.clone(), identity.clone())
        .oneshot(request(
            "POST",
            "/api/admin/users",
            ADMIN_TOKEN,
            Some(json!({ "email": "no-at-sign", "password": "123", "name": "", "role": "encoder" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(response).await,
        json!({ "error": "invalid fields: email, password, name" })
    );

    let response = router(store, identity)
        .oneshot(request(
            "POST",
            "/api/admin/users",
            ADMIN_TOKEN,
            Some(json!({
                "email": "agent@example.com",
                "password": "s3cret!",
                "name": "Copy",
                "role": "encoder",
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_keeps_identity_and_profile_in_step() {
    let (store, identity) = backend();
    let response = router(store.clone(), identity.clone())
        .oneshot(request(
            "PATCH",
            "/api/admin/users/u-agent",
            MODERATOR_TOKEN,
            Some(json!({ "email": "andy@example.com", "password": "changed1" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["profile"]["email"], json!("andy@example.com"));
    assert_eq!(body["profile"]["name"], json!("Andy"));
    assert_eq!(
        identity.identity("u-agent").map(|found| found.email),
        Some("andy@example.com".to_string())
    );
    assert!(identity.password_matches("u-agent", "changed1"));

    let response = router(store, identity)
        .oneshot(request(
            "PUT",
            "/api/admin/users/missing",
            ADMIN_TOKEN,
            Some(json!({ "name": "Ghost" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_both_records_but_never_the_caller() {
    let (store, identity) = backend();
    let response = router(store.clone(), identity.clone())
        .oneshot(request("DELETE", "/api/admin/users/u-admin", ADMIN_TOKEN, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router(store.clone(), identity.clone())
        .oneshot(request("DELETE", "/api/admin/users/u-agent", MODERATOR_TOKEN, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(identity.identity("u-agent").is_none());
    assert!(store
        .find(Collection::UserProfiles, "u-agent")
        .await
        .expect("find")
        .is_none());
}

#[tokio::test]
async fn failed_identity_update_restores_the_profile() {
    let (store, identity) = backend();
    identity.set_writes_unavailable(true);

    let response = router(store.clone(), identity.clone())
        .oneshot(request(
            "PATCH",
            "/api/admin/users/u-agent",
            ADMIN_TOKEN,
            Some(json!({ "email": "andy@example.com", "name": "Andrew" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let stored = store
        .find(Collection::UserProfiles, "u-agent")
        .await
        .expect("find")
        .expect("profile row");
    assert_eq!(stored["email"], json!("agent@example.com"));
    assert_eq!(stored["name"], json!("Andy"));
    assert_eq!(
        identity.identity("u-agent").map(|found| found.email),
        Some("agent@example.com".to_string())
    );
}

#[tokio::test]
async fn profile_without_identity_is_not_found_and_left_unchanged() {
    let (store, identity) = backend();
    store.seed(
        Collection::UserProfiles,
        [json!({ "id": "u-ghost", "email": "ghost@example.com", "name": "Gus", "role": "agent" })
            .as_object()
            .cloned()
            .expect("object")],
    );

    let response = router(store.clone(), identity)
        .oneshot(request(
            "PATCH",
            "/api/admin/users/u-ghost",
            ADMIN_TOKEN,
            Some(json!({ "password": "changed1", "name": "Gustavo" })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let stored = store
        .find(Collection::UserProfiles, "u-ghost")
        .await
        .expect("find")
        .expect("profile row");
    assert_eq!(stored["name"], json!("Gus"));
}

#[tokio::test]
async fn failed_identity_removal_is_reported() {
    let (store, identity) = backend();
    identity.set_writes_unavailable(true);

    let response = router(store, identity.clone())
        .oneshot(request("DELETE", "/api/admin/users/u-agent", ADMIN_TOKEN, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(identity.identity("u-agent").is_some());
}

#[tokio::test]
async fn unsupported_methods_are_rejected() {
    let (store, identity) = backend();
    let response = router(store, identity)
        .oneshot(request("DELETE", "/api/admin/users", ADMIN_TOKEN, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn moderators_list_only_accounts_they_manage() {
    let (store, identity) = backend();
    let response = router(store, identity)
        .oneshot(request("GET", "/api/admin/users", MODERATOR_TOKEN, None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    let mut ids: Vec<&str> = body["users"]
        .as_array()
        .expect("users")
        .iter()
        .filter_map(|user| user["id"].as_str())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["u-agent", "u-mod"]);
}
