use serde::Serialize;

use super::entities::Submission;
use crate::models::workflows::responses::WorkflowStatusInfo;

// 创建提交响应
#[derive(Debug, Clone, Serialize)]
pub struct CreateSubmissionResponse {
    pub submission: Submission,
    pub workflow: WorkflowStatusInfo,
}
