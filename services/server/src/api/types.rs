//! API request and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response envelope shared by every JSON endpoint
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: &str, message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message,
            }),
        }
    }
}

/// Body for POST /api/agents/:agent_id/deploy
#[derive(Debug, Deserialize)]
pub struct DeployRequest {
    pub version_id: Uuid,
}

/// Query for GET /api/agents/:agent_id/deployments
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Default page size for deployment listings
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Body for POST /api/deployments/:id/working-memory
#[derive(Debug, Deserialize)]
pub struct InjectRequest {
    pub content: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_omits_error() {
        let envelope = ApiEnvelope::ok(serde_json::json!({"k": 1}));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["k"], 1);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_err_envelope_omits_data() {
        let envelope = ApiEnvelope::<()>::err("NOT_FOUND", "missing".to_string());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json.get("data").is_none());
    }
}
