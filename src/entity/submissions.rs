//! 提交实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: String,
    pub student_id: String,
    pub course_id: String,
    pub item_id: String,
    #[sea_orm(column_type = "Text")]
    pub answer: String,
    // 微秒时间戳
    pub submitted_at: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::scores::Entity")]
    Scores,
    #[sea_orm(has_many = "super::assessments::Entity")]
    Assessments,
    #[sea_orm(has_one = "super::workflows::Entity")]
    Workflow,
}

impl Related<super::scores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scores.def()
    }
}

impl Related<super::assessments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assessments.def()
    }
}

impl Related<super::workflows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workflow.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_submission(
        self,
    ) -> crate::errors::Result<crate::models::submissions::entities::Submission> {
        use crate::models::submissions::entities::{StudentItem, Submission};
        use chrono::{DateTime, Utc};

        Ok(Submission {
            answer: serde_json::from_str(&self.answer)?,
            uuid: self.uuid,
            student_item: StudentItem {
                student_id: self.student_id,
                item_id: self.item_id,
                course_id: self.course_id,
            },
            submitted_at: DateTime::<Utc>::from_timestamp_micros(self.submitted_at)
                .unwrap_or_default(),
            created_at: DateTime::<Utc>::from_timestamp_micros(self.created_at)
                .unwrap_or_default(),
        })
    }
}
