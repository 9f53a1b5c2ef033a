//! 工作流实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workflows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub uuid: String,
    #[sea_orm(unique)]
    pub submission_uuid: String,
    pub course_id: String,
    pub item_id: String,
    pub status: String,
    pub created_at: i64,
    pub modified_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submissions::Entity",
        from = "Column::SubmissionUuid",
        to = "super::submissions::Column::Uuid"
    )]
    Submission,
    #[sea_orm(has_many = "super::workflow_steps::Entity")]
    Steps,
}

impl Related<super::submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl Related<super::workflow_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Steps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 组装业务模型，步骤按 `order_num` 排列
    pub fn into_workflow(
        self,
        steps: Vec<super::workflow_steps::Model>,
    ) -> crate::errors::Result<crate::models::workflows::entities::Workflow> {
        use crate::models::workflows::entities::Workflow;
        use chrono::{DateTime, Utc};

        let mut steps = steps
            .into_iter()
            .map(super::workflow_steps::Model::into_step)
            .collect::<crate::errors::Result<Vec<_>>>()?;
        steps.sort_by_key(|step| step.order_num);

        Ok(Workflow {
            id: self.id,
            uuid: self.uuid,
            submission_uuid: self.submission_uuid,
            course_id: self.course_id,
            item_id: self.item_id,
            status: self.status.parse()?,
            steps,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            modified_at: DateTime::<Utc>::from_timestamp(self.modified_at, 0)
                .unwrap_or_default(),
        })
    }
}
