//! 评分标准模型
//!
//! 评分标准由有序的评分项组成，每个评分项包含有序的选项及其分值。
//! 内容哈希由结构确定性地导出，用于检测发布后评分标准是否被修改。

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 评分项的文字反馈策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackPolicy {
    #[default]
    Disabled,
    Optional,
    Required,
}

/// 评分项选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionOption {
    pub name: String,
    #[serde(default)]
    pub explanation: String,
    pub points: i32,
}

/// 评分项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub feedback: FeedbackPolicy,
    pub options: Vec<CriterionOption>,
}

impl Criterion {
    pub fn option(&self, name: &str) -> Option<&CriterionOption> {
        self.options.iter().find(|option| option.name == name)
    }

    /// 该评分项可获得的最高分
    pub fn points_possible(&self) -> i32 {
        self.options
            .iter()
            .map(|option| option.points)
            .max()
            .unwrap_or(0)
    }
}

/// 评分标准
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub criteria: Vec<Criterion>,
}

impl Rubric {
    pub fn criterion(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| criterion.name == name)
    }

    pub fn points_possible(&self) -> i32 {
        self.criteria.iter().map(Criterion::points_possible).sum()
    }

    /// 内容哈希（SHA-256 十六进制）
    ///
    /// 基于字段声明顺序的 JSON 序列化，名称、分值或顺序的任何变化都会改变哈希。
    pub fn content_hash(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hex::encode(hasher.finalize())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_points_possible() {
        assert_eq!(ideas_rubric().points_possible(), 5);
        assert_eq!(two_criteria_rubric().points_possible(), 7);
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = two_criteria_rubric();
        let b = two_criteria_rubric();
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }

    #[test]
    fn test_content_hash_detects_changes() {
        let original = ideas_rubric();

        let mut repointed = original.clone();
        repointed.criteria[0].options[1].points = 4;
        assert_ne!(original.content_hash(), repointed.content_hash());

        let mut reordered = original.clone();
        reordered.criteria[0].options.swap(0, 2);
        assert_ne!(original.content_hash(), reordered.content_hash());
    }

    #[test]
    fn test_feedback_policy_wire_names() {
        let json = r#"{"name":"Ideas","feedback":"required","options":[{"name":"Good","points":3}]}"#;
        let criterion: Criterion = serde_json::from_str(json).unwrap();
        assert_eq!(criterion.feedback, FeedbackPolicy::Required);

        let json = r#"{"name":"Ideas","options":[]}"#;
        let criterion: Criterion = serde_json::from_str(json).unwrap();
        assert_eq!(criterion.feedback, FeedbackPolicy::Disabled);
    }
}
