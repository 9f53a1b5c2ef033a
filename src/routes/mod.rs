pub mod peer;

pub mod submissions;

pub mod validation;

pub mod workflows;

pub use peer::configure_peer_routes;
pub use submissions::configure_submissions_routes;
pub use validation::configure_validation_routes;
pub use workflows::configure_workflows_routes;

use actix_web::HttpResponse;
use serde::Serialize;

use crate::errors::{AssessmentError, ErrorTier, Result};
use crate::models::{ApiResponse, ErrorCode};

/// 将服务层结果转换为统一响应
///
/// 请求错误返回具体原因；工作流错误与内部错误只返回通用提示，详情已由服务层记录。
pub(crate) fn respond<T: Serialize>(result: Result<T>, message: &str) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::success(data, message)),
        Err(err) => error_response(&err),
    }
}

pub(crate) fn error_response(err: &AssessmentError) -> HttpResponse {
    let body = ApiResponse::error_empty(error_code(err), err.user_message());
    match err {
        AssessmentError::NotFound(_) => HttpResponse::NotFound().json(body),
        _ => match err.tier() {
            ErrorTier::Request => HttpResponse::BadRequest().json(body),
            ErrorTier::Workflow | ErrorTier::Internal => {
                HttpResponse::InternalServerError().json(body)
            }
        },
    }
}

fn error_code(err: &AssessmentError) -> ErrorCode {
    match err {
        AssessmentError::NotFound(_) => ErrorCode::WorkflowNotFound,
        _ => ErrorCode::from(err.tier()),
    }
}
