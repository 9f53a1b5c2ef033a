use serde::Deserialize;
use crate::models::steps::entities::StepSpec;

// 状态统计查询参数，`steps` 为逗号分隔的步骤名称
#[derive(Debug, Clone, Deserialize)]
pub struct StatusCountQuery {
    pub course_id: String,
    pub item_id: String,
    #[serde(default)]
    pub steps: Option<String>,
}

// 为已有提交创建工作流
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowRequest {
    pub steps: Vec<StepSpec>,
}
