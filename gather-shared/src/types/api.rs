use serde::{Deserialize, Serialize};

/// Error body the `AppError` response mapping emits. Success payloads
/// are plain data structures (rows or `SearchResults` envelopes), so
/// only the failure side needs a shared shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_carries_code_message_and_optional_details() {
        let bare = serde_json::to_value(ApiErrorResponse::new("E2002", "duplicate forum")).unwrap();
        assert_eq!(bare["success"], false);
        assert_eq!(bare["error"]["code"], "E2002");
        assert_eq!(bare["error"]["message"], "duplicate forum");
        assert!(bare["error"].get("details").is_none());

        let with_details = ApiErrorResponse::new("E2002", "duplicate forum")
            .with_details(serde_json::json!({ "forumId": "abc" }));
        let value = serde_json::to_value(with_details).unwrap();
        assert_eq!(value["error"]["details"]["forumId"], "abc");
    }
}
