//! 评估实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assessments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub submission_uuid: String,
    pub rubric_id: i64,
    pub scorer_id: String,
    pub scorer_submission_uuid: String,
    pub score_type: String,
    #[sea_orm(column_type = "Text")]
    pub feedback: String,
    pub points_possible: i32,
    pub scored_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionUuid",
        to = "super::submissions::Column::Uuid"
    )]
    Submission,
    #[sea_orm(
        belongs_to = "super::rubrics::Entity",
        from = "Column::RubricId",
        to = "super::rubrics::Column::Id"
    )]
    Rubric,
    #[sea_orm(has_many = "super::assessment_parts::Entity")]
    Parts,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::rubrics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rubric.def()
    }
}

impl Related<super::assessment_parts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 组装业务模型，明细和评分标准哈希需另行查询
    pub fn into_assessment(
        self,
        rubric_hash: String,
        parts: Vec<crate::models::assessments::entities::AssessmentPart>,
    ) -> crate::errors::Result<crate::models::assessments::entities::Assessment> {
        use crate::models::assessments::entities::Assessment;
        use chrono::{DateTime, Utc};

        Ok(Assessment {
            id: self.id,
            score_type: self.score_type.parse()?,
            points_earned: parts.iter().map(|part| part.points).sum(),
            submission_uuid: self.submission_uuid,
            scorer_id: self.scorer_id,
            scorer_submission_uuid: self.scorer_submission_uuid,
            rubric_hash,
            feedback: self.feedback,
            points_possible: self.points_possible,
            scored_at: DateTime::<Utc>::from_timestamp(self.scored_at, 0).unwrap_or_default(),
            parts,
        })
    }
}
