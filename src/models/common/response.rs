use serde::{Deserialize, Serialize};

use crate::models::ErrorCode;

/// 统一的 API 响应信封
///
/// `code` 为 0 表示成功；失败时 `message` 为面向用户的提示，不含内部细节。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T> {
    fn with_code(code: ErrorCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ErrorCode::Success as i32
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self::with_code(ErrorCode::Success, Some(data), message)
    }

    // 失败但仍携带数据，例如校验结果
    pub fn error(code: ErrorCode, data: T, message: impl Into<String>) -> Self {
        Self::with_code(code, Some(data), message)
    }
}

impl ApiResponse<()> {
    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_code(code, None, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_error_omits_data() {
        let response = ApiResponse::error_empty(ErrorCode::WorkflowError, "retry");
        assert!(!response.is_success());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], ErrorCode::WorkflowError as i32);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_success_carries_data() {
        let response = ApiResponse::success(vec![1, 2], "ok");
        assert!(response.is_success());
        assert_eq!(response.data, Some(vec![1, 2]));
    }
}
