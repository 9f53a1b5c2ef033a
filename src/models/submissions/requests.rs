use serde::Deserialize;

use super::entities::StudentItem;
use crate::models::steps::entities::StepSpec;

// 创建提交请求（同时创建工作流）
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubmissionRequest {
    pub student_item: StudentItem,
    pub answer: serde_json::Value,
    pub steps: Vec<StepSpec>,
}

// 游标分页查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionListQuery {
    pub course_id: String,
    pub item_id: String,
    pub cursor: Option<String>,
    pub limit: Option<u64>,
}
