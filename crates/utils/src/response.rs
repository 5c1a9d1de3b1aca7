use serde::{Deserialize, Serialize};

/// Envelope returned by every API handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_omits_message() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 42 }));
    }

    #[test]
    fn test_error_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error("bad cadence")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "bad cadence" })
        );
    }
}
