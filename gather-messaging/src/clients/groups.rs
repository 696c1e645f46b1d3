use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gather_shared::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Approved,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembershipRecord {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: GroupRole,
    pub status: MembershipStatus,
}

/// The external group-membership registry. Forums double as groups
/// there, keyed by forum id.
#[async_trait]
pub trait GroupMembershipApi: Send + Sync {
    async fn register_group(
        &self,
        group_id: Uuid,
        role: GroupRole,
        status: MembershipStatus,
        member_ids: &[Uuid],
    ) -> AppResult<Vec<GroupMembershipRecord>>;

    async fn get_user_groups(&self, user_id: Uuid) -> AppResult<Vec<GroupMembershipRecord>>;

    async fn count_members(&self, group_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i64>>;
}

#[derive(Clone)]
pub struct HttpGroupMembership {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGroupMembership {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl GroupMembershipApi for HttpGroupMembership {
    async fn register_group(
        &self,
        group_id: Uuid,
        role: GroupRole,
        status: MembershipStatus,
        member_ids: &[Uuid],
    ) -> AppResult<Vec<GroupMembershipRecord>> {
        let url = format!("{}/internal/user-groups", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "groupId": group_id,
                "role": role,
                "status": status,
                "memberIds": member_ids,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, group_id = %group_id, "group membership service unreachable");
                AppError::external("group membership service unreachable")
            })?
            .error_for_status()
            .map_err(|e| AppError::external(format!("group registration rejected: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AppError::external(format!("malformed group registration response: {e}")))
    }

    async fn get_user_groups(&self, user_id: Uuid) -> AppResult<Vec<GroupMembershipRecord>> {
        let url = format!("{}/internal/users/{}/user-groups", self.base_url, user_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "group membership service unreachable");
                AppError::external("group membership service unreachable")
            })?
            .error_for_status()
            .map_err(|e| AppError::external(format!("user groups lookup failed: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AppError::external(format!("malformed user groups response: {e}")))
    }

    async fn count_members(&self, group_ids: &[Uuid]) -> AppResult<HashMap<Uuid, i64>> {
        if group_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/internal/user-groups/member-counts", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "groupIds": group_ids }))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "group membership service unreachable");
                AppError::external("group membership service unreachable")
            })?
            .error_for_status()
            .map_err(|e| AppError::external(format!("member count lookup failed: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AppError::external(format!("malformed member count response: {e}")))
    }
}
