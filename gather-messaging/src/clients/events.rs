use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gather_shared::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_public: bool,
}

/// The external event calendar. Activities are forums with a calendar
/// entry attached.
#[async_trait]
pub trait EventCalendarApi: Send + Sync {
    async fn create_event(&self, group_id: Uuid, payload: &EventPayload) -> AppResult<Event>;
}

#[derive(Clone)]
pub struct HttpEventCalendar {
    http: reqwest::Client,
    base_url: String,
}

impl HttpEventCalendar {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EventCalendarApi for HttpEventCalendar {
    async fn create_event(&self, group_id: Uuid, payload: &EventPayload) -> AppResult<Event> {
        let url = format!("{}/internal/groups/{}/events", self.base_url, group_id);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, group_id = %group_id, "event calendar unreachable");
                AppError::external("event calendar unreachable")
            })?
            .error_for_status()
            .map_err(|e| AppError::external(format!("event creation rejected: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| AppError::external(format!("malformed event response: {e}")))
    }
}
