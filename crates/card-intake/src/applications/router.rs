use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::aggregator::{ApplicationFilter, DEFAULT_PAGE_SIZE};
use super::domain::{ApplicationId, ApplicationSubmission};
use super::service::{ApplicationService, ApplicationServiceError, StatusChange};
use crate::auth::{bearer_token, IdentityProvider, Session, SessionError};
use crate::store::{RecordStore, StoreError};

/// Query string accepted by the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(alias = "searchText")]
    pub search: Option<String>,
    pub page: Option<usize>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<usize>,
}

/// Router exposing listing, dashboards, intake, review, and import endpoints.
pub fn application_router<S, I>(service: Arc<ApplicationService<S, I>>) -> Router
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/session", get(session_handler::<S, I>))
        .route(
            "/api/v1/applications",
            get(list_handler::<S, I>).post(submit_handler::<S, I>),
        )
        .route(
            "/api/v1/applications/dashboard",
            get(dashboard_handler::<S, I>),
        )
        .route(
            "/api/v1/applications/import",
            post(import_handler::<S, I>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(get_handler::<S, I>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            post(status_handler::<S, I>).put(status_handler::<S, I>),
        )
        .route("/api/v1/banks/report", get(bank_report_handler::<S, I>))
        .with_state(service)
}

pub(crate) async fn session_handler<S, I>(
    State(service): State<Arc<ApplicationService<S, I>>>,
    headers: HeaderMap,
) -> Response
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    match service.session(bearer_token(&headers)).await {
        Ok(session) => (StatusCode::OK, Json(session.view())).into_response(),
        Err(err) => error_response(err.into()),
    }
}

pub(crate) async fn list_handler<S, I>(
    State(service): State<Arc<ApplicationService<S, I>>>,
    Query(query): Query<ListQuery>,
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

    let filter = ApplicationFilter {
        status: query.status,
        search: query.search,
    };
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    match service.list(&session, &filter, page, page_size).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<S, I>(
    State(service): State<Arc<ApplicationService<S, I>>>,
    headers: HeaderMap,
    payload: Result<Json<ApplicationSubmission>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let session = match open_session(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    match service.submit(&session, submission).await {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn dashboard_handler<S, I>(
    State(service): State<Arc<ApplicationService<S, I>>>,
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

    match service.dashboard(&session).await {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S, I>(
    State(service): State<Arc<ApplicationService<S, I>>>,
    Path(application_id): Path<String>,
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

    match service.get(&session, &ApplicationId(application_id)).await {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<S, I>(
    State(service): State<Arc<ApplicationService<S, I>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let session = match open_session(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Json(change) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let id = ApplicationId(application_id);
    match service.update_status(&session, &id, change).await {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Accepts the raw CSV text as the request body.
pub(crate) async fn import_handler<S, I>(
    State(service): State<Arc<ApplicationService<S, I>>>,
    headers: HeaderMap,
    body: String,
) -> Response
where
    S: RecordStore + 'static,
    I: IdentityProvider + 'static,
{
    let session = match open_session(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match service.import_csv(&session, &body).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn bank_report_handler<S, I>(
    State(service): State<Arc<ApplicationService<S, I>>>,
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

    match service.bank_report(&session).await {
        Ok(report) => (StatusCode::OK, Json(json!({ "banks": report }))).into_response(),
        Err(err) => error_response(err),
    }
}

async fn open_session<S, I>(
    service: &ApplicationService<S, I>,
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

pub(crate) fn error_response(err: ApplicationServiceError) -> Response {
    match err {
        ApplicationServiceError::Validation(validation) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": validation.to_string(),
                "fields": validation.fields,
            })),
        )
            .into_response(),
        ApplicationServiceError::Session(SessionError::Forbidden) => {
            (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response()
        }
        ApplicationServiceError::Session(SessionError::Store(store))
        | ApplicationServiceError::Store(store) => upstream_failure(&store),
        ApplicationServiceError::Session(session) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": session.to_string() })),
        )
            .into_response(),
        not_found @ ApplicationServiceError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": not_found.to_string() })),
        )
            .into_response(),
        rejected @ (ApplicationServiceError::ReadOnlySource(_)
        | ApplicationServiceError::InvalidStatus(_)
        | ApplicationServiceError::Import(_)) => bad_request(rejected.to_string()),
        ApplicationServiceError::Transform(transform) => {
            tracing::warn!(error = %transform, "stored application could not be read");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "stored application could not be read" })),
            )
                .into_response()
        }
    }
}

fn upstream_failure(err: &StoreError) -> Response {
    tracing::warn!(error = %err, "application request failed upstream");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "unable to reach the data store" })),
    )
        .into_response()
}
