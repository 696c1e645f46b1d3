use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gather_shared::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessPolicy {
    CreateGroups,
    ModerateContent,
}

/// The external user directory. Batch resolution keeps enrichment to
/// one call per search.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_users(&self, ids: &[Uuid]) -> AppResult<Vec<UserSummary>>;
    async fn is_authorized(&self, policy: AccessPolicy, user_id: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct HttpUserDirectory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpUserDirectory {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuthorizationResponse {
    authorized: bool,
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn find_users(&self, ids: &[Uuid]) -> AppResult<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/internal/users/batch", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "ids": ids }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "user directory unreachable");
                AppError::external("user directory unreachable")
            })?
            .error_for_status()
            .map_err(|e| AppError::external(format!("user directory rejected batch lookup: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AppError::external(format!("malformed user directory response: {e}")))
    }

    async fn is_authorized(&self, policy: AccessPolicy, user_id: Uuid) -> AppResult<bool> {
        let url = format!("{}/internal/users/{}/authorization", self.base_url, user_id);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "policy": policy }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "user directory unreachable");
                AppError::external("user directory unreachable")
            })?
            .error_for_status()
            .map_err(|e| AppError::external(format!("authorization check failed: {e}")))?;

        let body: AuthorizationResponse = response
            .json()
            .await
            .map_err(|e| AppError::external(format!("malformed authorization response: {e}")))?;
        Ok(body.authorized)
    }
}
