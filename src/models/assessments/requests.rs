use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::rubrics::entities::Rubric;

/// 创建互评的输入
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAssessment {
    // 被评估的提交
    pub submission_uuid: String,
    // 评估者自己的提交
    pub scorer_submission_uuid: String,
    pub scorer_id: String,
    // 评分项名称 -> 选项名称
    pub options_selected: BTreeMap<String, String>,
    // 评分项名称 -> 文字反馈
    #[serde(default)]
    pub criterion_feedback: BTreeMap<String, String>,
    #[serde(default)]
    pub overall_feedback: String,
}

// 领取下一份待评提交
#[derive(Debug, Clone, Deserialize)]
pub struct NextPeerRequest {
    pub requesting_submission_uuid: String,
    pub required_num_assessments: u32,
    pub over_grading_allowed: Option<bool>,
}

// 提交互评
#[derive(Debug, Clone, Deserialize)]
pub struct PeerAssessRequest {
    #[serde(flatten)]
    pub assessment: CreateAssessment,
    pub rubric: Rubric,
}

// 提交自评
#[derive(Debug, Clone, Deserialize)]
pub struct SelfAssessRequest {
    pub submission_uuid: String,
    pub user_id: String,
    pub options_selected: BTreeMap<String, String>,
    pub rubric: Rubric,
}

// 查询互评进度
#[derive(Debug, Clone, Deserialize)]
pub struct PeerProgressQuery {
    pub submission_uuid: String,
    pub required: u32,
}
