//! 数据模型定义

pub mod assessments;
pub mod common;
pub mod rubrics;
pub mod steps;
pub mod submissions;
pub mod validation;
pub mod workflows;

pub use common::pagination::{SubmissionCursor, SubmissionPage};
pub use common::response::ApiResponse;

/// 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    // 请求错误
    BadRequest = 1000,
    ValidationFailed = 1001,

    // 工作流错误
    WorkflowError = 2000,
    WorkflowNotFound = 2001,

    // 服务器错误
    InternalServerError = 5000,
}

impl From<crate::errors::ErrorTier> for ErrorCode {
    fn from(tier: crate::errors::ErrorTier) -> Self {
        match tier {
            crate::errors::ErrorTier::Request => ErrorCode::BadRequest,
            crate::errors::ErrorTier::Workflow => ErrorCode::WorkflowError,
            crate::errors::ErrorTier::Internal => ErrorCode::InternalServerError,
        }
    }
}
