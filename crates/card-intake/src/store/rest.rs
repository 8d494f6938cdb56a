use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{Collection, RecordStore, Row, StoreError};
use crate::auth::{AuthIdentity, IdentityProvider};

/// REST client for the hosted store's table API and its auth admin API.
#[derive(Clone)]
pub struct HostedStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl HostedStore {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            service_key: service_key.into(),
        }
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.name())
    }

    fn admin_users_url(&self) -> String {
        format!("{}/auth/v1/admin/users", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        ensure_success(response).await
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Row>, StoreError> {
        let response = self.send(request).await?;
        response
            .json::<Vec<Row>>()
            .await
            .map_err(|err| StoreError::Malformed(err.to_string()))
    }
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn id_filter(id: &str) -> String {
    format!("eq.{id}")
}

#[async_trait]
impl RecordStore for HostedStore {
    async fn fetch_page(
        &self,
        collection: Collection,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        let request = self
            .authorized(self.client.get(self.table_url(collection)))
            .query(&[
                ("select", "*".to_string()),
                ("order", "id.asc".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ]);
        self.rows(request).await
    }

    async fn find(&self, collection: Collection, id: &str) -> Result<Option<Row>, StoreError> {
        let request = self
            .authorized(self.client.get(self.table_url(collection)))
            .query(&[("select", "*".to_string()), ("id", id_filter(id))]);
        Ok(self.rows(request).await?.into_iter().next())
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError> {
        let request = self
            .authorized(self.client.post(self.table_url(collection)))
            .header("Prefer", "return=representation")
            .json(&row);
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed("insert returned no rows".to_string()))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Row,
    ) -> Result<Row, StoreError> {
        let request = self
            .authorized(self.client.patch(self.table_url(collection)))
            .query(&[("id", id_filter(id))])
            .header("Prefer", "return=representation")
            .json(&patch);
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let request = self
            .authorized(self.client.delete(self.table_url(collection)))
            .query(&[("id", id_filter(id))])
            .header("Prefer", "return=representation");
        if self.rows(request).await?.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct AuthUserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<AuthUserPayload> for AuthIdentity {
    fn from(payload: AuthUserPayload) -> Self {
        Self {
            id: payload.id,
            email: payload.email.unwrap_or_default(),
        }
    }
}

async fn identity_from(response: Response) -> Result<AuthIdentity, StoreError> {
    response
        .json::<AuthUserPayload>()
        .await
        .map(AuthIdentity::from)
        .map_err(|err| StoreError::Malformed(err.to_string()))
}

#[async_trait]
impl IdentityProvider for HostedStore {
    async fn resolve_token(&self, token: &str) -> Result<Option<AuthIdentity>, StoreError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.service_key)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        identity_from(response).await.map(Some)
    }

    async fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, StoreError> {
        let request = self
            .authorized(self.client.post(self.admin_users_url()))
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }));
        let response = self.send(request).await?;
        identity_from(response).await
    }

    async fn update_identity(
        &self,
        id: &str,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut body = serde_json::Map::new();
        if let Some(email) = email {
            body.insert("email".to_string(), Value::from(email));
        }
        if let Some(password) = password {
            body.insert("password".to_string(), Value::from(password));
        }
        if body.is_empty() {
            return Ok(());
        }

        let request = self
            .authorized(
                self.client
                    .put(format!("{}/{}", self.admin_users_url(), id)),
            )
            .json(&body);
        self.send(request).await?;
        Ok(())
    }

    async fn delete_identity(&self, id: &str) -> Result<(), StoreError> {
        let request = self.authorized(
            self.client
                .delete(format!("{}/{}", self.admin_users_url(), id)),
        );
        match self.send(request).await {
            Err(StoreError::Rejected { status: 404, .. }) => Err(StoreError::NotFound),
            other => other.map(|_| ()),
        }
    }
}
