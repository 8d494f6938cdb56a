use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;

use super::service::{NewUser, UserAdminError, UserAdminService, UserUpdate};
use crate::auth::{bearer_token, IdentityProvider, Session, SessionError};
use crate::store::{RecordStore, StoreError};

/// Role-gated account administration endpoints.
pub fn admin_router<S, I>(service: Arc<UserAdminService<S, I>>) -> Router
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route(
            "/api/admin/users",
            get(list_handler::<S, I>)
                .post(create_handler::<S, I>)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/admin/users/:user_id",
            put(update_handler::<S, I>)
                .patch(update_handler::<S, I>)
                .delete(delete_handler::<S, I>)
                .fallback(method_not_allowed),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<S, I>(
    State(service): State<Arc<UserAdminService<S, I>>>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let session = match open_session(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match service.list(&session).await {
        Ok(users) => (StatusCode::OK, Json(json!({ "users": users }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<S, I>(
    State(service): State<Arc<UserAdminService<S, I>>>,
    headers: HeaderMap,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let session = match open_session(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.create(&session, request).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S, I>(
    State(service): State<Arc<UserAdminService<S, I>>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let session = match open_session(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.update(&session, &user_id, update).await {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S, I>(
    State(service): State<Arc<UserAdminService<S, I>>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let session = match open_session(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match service.delete(&session, &user_id).await {
        Ok(deleted) => (StatusCode::OK, Json(deleted)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

async fn open_session<S, I>(
    service: &UserAdminService<S, I>,
    headers: &HeaderMap,
) -> Result<Session, Response>
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    service
        .session(bearer_token(headers))
        .await
        .map_err(|err| error_response(err.into()))
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn error_response(err: UserAdminError) -> Response {
    let (status, message) = match &err {
        UserAdminError::Session(SessionError::Forbidden) => {
            (StatusCode::FORBIDDEN, "Forbidden".to_string())
        }
        UserAdminError::Session(SessionError::Store(store)) => {
            tracing::warn!(error = %store, "session lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "unable to reach the data store".to_string(),
            )
        }
        UserAdminError::Session(_) => (StatusCode::UNAUTHORIZED, err.to_string()),
        UserAdminError::Invalid(_) | UserAdminError::SelfDeletion => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        UserAdminError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        UserAdminError::Store(StoreError::Rejected { status, message })
            if (400..500).contains(status) =>
        {
            (StatusCode::BAD_REQUEST, message.clone())
        }
        UserAdminError::Store(store) => {
            tracing::warn!(error = %store, "user administration failed upstream");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "unable to reach the data store".to_string(),
            )
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}
