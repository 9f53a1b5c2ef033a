use serde::{Deserialize, Serialize};

use crate::errors::{AssessmentError, Result};
use crate::models::submissions::entities::Submission;

/// 提交分页游标
///
/// 排序键为 (created_at 微秒, uuid)，翻页期间即使有新提交插入，
/// 也不会跳过或重复已有提交。对外以不透明字符串传递。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCursor {
    pub created_at: i64,
    pub uuid: String,
}

impl SubmissionCursor {
    pub fn after(submission: &Submission) -> Self {
        Self {
            created_at: submission.created_at.timestamp_micros(),
            uuid: submission.uuid.clone(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.created_at, self.uuid)
    }

    pub fn decode(token: &str) -> Result<Self> {
        let (created_at, uuid) = token
            .split_once('.')
            .ok_or_else(|| AssessmentError::request(format!("Malformed cursor: {token}")))?;
        let created_at = created_at
            .parse::<i64>()
            .map_err(|_| AssessmentError::request(format!("Malformed cursor: {token}")))?;
        if uuid.is_empty() {
            return Err(AssessmentError::request(format!("Malformed cursor: {token}")));
        }
        Ok(Self {
            created_at,
            uuid: uuid.to_string(),
        })
    }
}

// 游标分页响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPage {
    pub items: Vec<Submission>,
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrip() {
        let cursor = SubmissionCursor {
            created_at: 1_700_000_000_123_456,
            uuid: "0b7e3f2a-5f43-4c8e-9d55-2d8cfa6f1e01".to_string(),
        };
        let decoded = SubmissionCursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_malformed_cursor_is_request_error() {
        for token in ["", "abc", "12.", "x.uuid"] {
            let err = SubmissionCursor::decode(token).unwrap_err();
            assert_eq!(err.tier(), crate::errors::ErrorTier::Request, "{token}");
        }
    }
}
