//! 工作流步骤实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workflow_steps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub workflow_id: i64,
    pub name: String,
    pub order_num: i32,
    pub must_grade: Option<i32>,
    pub must_be_graded_by: Option<i32>,
    pub start_at: Option<i64>,
    pub due_at: Option<i64>,
    pub submitter_completed_at: Option<i64>,
    pub assessment_completed_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workflows::Entity",
        from = "Column::WorkflowId",
        to = "super::workflows::Column::Id"
    )]
    Workflow,
}

impl Related<super::workflows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workflow.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_step(
        self,
    ) -> crate::errors::Result<crate::models::workflows::entities::WorkflowStep> {
        use crate::models::steps::entities::PeerRequirements;
        use crate::models::workflows::entities::WorkflowStep;
        use crate::validation::DateRange;
        use chrono::{DateTime, Utc};

        let requirements = match (self.must_grade, self.must_be_graded_by) {
            (Some(must_grade), Some(must_be_graded_by)) => Some(PeerRequirements {
                must_grade: must_grade.max(0) as u32,
                must_be_graded_by: must_be_graded_by.max(0) as u32,
            }),
            _ => None,
        };

        Ok(WorkflowStep {
            id: self.id,
            name: self.name.parse()?,
            order_num: self.order_num,
            requirements,
            window: DateRange {
                start: self
                    .start_at
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
                due: self.due_at.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            },
            submitter_completed_at: self
                .submitter_completed_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            assessment_completed_at: self
                .assessment_completed_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        })
    }
}
