use serde::{Deserialize, Serialize};

/// 学生作答项：课程 + 题目 + 学生
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentItem {
    pub student_id: String,
    pub item_id: String,
    pub course_id: String,
}

/// 提交（创建后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    // 唯一 UUID
    pub uuid: String,
    // 所属作答项
    pub student_item: StudentItem,
    // 提交时间
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    // 创建时间
    pub created_at: chrono::DateTime<chrono::Utc>,
    // 原始作答内容
    pub answer: serde_json::Value,
}

/// 提交得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub submission_uuid: String,
    pub points_earned: i32,
    pub points_possible: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
