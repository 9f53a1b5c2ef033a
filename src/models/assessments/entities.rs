use serde::{Deserialize, Serialize};

use crate::models::rubrics::entities::Rubric;
use crate::models::steps::entities::StepName;

/// 评估明细：某评分项上选择的选项及反馈
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentPart {
    pub criterion_name: String,
    pub option_name: String,
    pub points: i32,
    pub feedback: String,
}

/// 评估（创建后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    // 被评估的提交
    pub submission_uuid: String,
    // 评估者学生 ID
    pub scorer_id: String,
    // 评估者自己的提交，用于统计其完成的评估数量
    pub scorer_submission_uuid: String,
    pub score_type: StepName,
    pub rubric_hash: String,
    pub feedback: String,
    pub points_earned: i32,
    pub points_possible: i32,
    pub scored_at: chrono::DateTime<chrono::Utc>,
    pub parts: Vec<AssessmentPart>,
}

/// 待持久化的评估，明细已按评分标准校验
#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub submission_uuid: String,
    pub scorer_id: String,
    pub scorer_submission_uuid: String,
    pub score_type: StepName,
    pub rubric: Rubric,
    pub feedback: String,
    pub parts: Vec<AssessmentPart>,
    pub scored_at: chrono::DateTime<chrono::Utc>,
}

impl NewAssessment {
    pub fn points_earned(&self) -> i32 {
        self.parts.iter().map(|part| part.points).sum()
    }
}

/// 互评领取记录：评估者已领取但可能尚未完成的提交
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerCheckout {
    pub scorer_submission_uuid: String,
    pub submission_uuid: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    // 完成后关联的评估
    pub assessment_id: Option<i64>,
}

impl PeerCheckout {
    pub fn is_open(&self) -> bool {
        self.assessment_id.is_none()
    }
}

/// 互评候选提交及其当前状态
#[derive(Debug, Clone, PartialEq)]
pub struct PeerCandidate {
    pub submission: crate::models::submissions::entities::Submission,
    // 已完成的互评数量
    pub assessment_count: u32,
    // 其他评估者最近一次未完成领取的时间
    pub checked_out_at: Option<chrono::DateTime<chrono::Utc>>,
}
