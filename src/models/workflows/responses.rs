use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entities::WorkflowStatus;
use crate::models::steps::entities::StepName;
use crate::models::submissions::entities::Score;

/// 单个步骤的完成情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStatusDetail {
    // 提交者已完成本步骤的任务
    pub complete: bool,
    // 提交已在本步骤获得足够评估
    pub scored: bool,
}

/// 工作流状态查询结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatusInfo {
    pub submission_uuid: String,
    pub status: WorkflowStatus,
    pub status_details: BTreeMap<StepName, StepStatusDetail>,
    pub score: Option<Score>,
}

/// 各状态的工作流数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: WorkflowStatus,
    pub count: u64,
}
