use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{AssessmentError, Result};
use crate::models::steps::entities::{PeerRequirements, StepName};
use crate::validation::DateRange;

/// 工作流状态
///
/// `waiting_to_start` → 各配置步骤 → `waiting` → `done`，`done` 为终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    WaitingToStart,
    Peer,
    #[serde(rename = "self")]
    SelfAssessment,
    // 提交者已完成自己的任务，等待他人评估
    Waiting,
    Done,
}

impl WorkflowStatus {
    // 步骤顺序只可能是 [peer, self] 或 [self]，因此全局顺序固定
    const ORDER: [WorkflowStatus; 5] = [
        WorkflowStatus::WaitingToStart,
        WorkflowStatus::Peer,
        WorkflowStatus::SelfAssessment,
        WorkflowStatus::Waiting,
        WorkflowStatus::Done,
    ];

    /// 在本状态之前的所有状态，工作流只能从这些状态前进到本状态
    pub fn preceding(&self) -> &'static [WorkflowStatus] {
        let index = Self::ORDER
            .iter()
            .position(|status| status == self)
            .unwrap_or(0);
        &Self::ORDER[..index]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::WaitingToStart => "waiting_to_start",
            WorkflowStatus::Peer => "peer",
            WorkflowStatus::SelfAssessment => "self",
            WorkflowStatus::Waiting => "waiting",
            WorkflowStatus::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Done)
    }
}

impl From<StepName> for WorkflowStatus {
    fn from(step: StepName) -> Self {
        match step {
            StepName::Peer => WorkflowStatus::Peer,
            StepName::SelfAssessment => WorkflowStatus::SelfAssessment,
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "waiting_to_start" => Ok(WorkflowStatus::WaitingToStart),
            "peer" => Ok(WorkflowStatus::Peer),
            "self" => Ok(WorkflowStatus::SelfAssessment),
            "waiting" => Ok(WorkflowStatus::Waiting),
            "done" => Ok(WorkflowStatus::Done),
            other => Err(AssessmentError::internal(format!(
                "Unknown workflow status '{other}'"
            ))),
        }
    }
}

/// 工作流中的单个步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: i64,
    pub name: StepName,
    pub order_num: i32,
    // 互评步骤的要求，创建工作流时固定
    pub requirements: Option<PeerRequirements>,
    // 步骤开放时间，缺失的边界表示不限制
    #[serde(default)]
    pub window: DateRange,
    // 提交者完成本步骤自身任务的时间
    pub submitter_completed_at: Option<chrono::DateTime<chrono::Utc>>,
    // 提交在本步骤获得足够评估的时间
    pub assessment_completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 每个提交一个工作流，只通过步骤完成事件推进，从不删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: i64,
    pub uuid: String,
    pub submission_uuid: String,
    pub course_id: String,
    pub item_id: String,
    pub status: WorkflowStatus,
    pub steps: Vec<WorkflowStep>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub modified_at: chrono::DateTime<chrono::Utc>,
}

impl Workflow {
    pub fn step(&self, name: StepName) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.name == name)
    }
}
