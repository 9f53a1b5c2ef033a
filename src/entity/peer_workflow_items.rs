//! 互评领取记录实体
//!
//! 记录评估者领取但尚未完成评估的提交，`assessment_id` 为空表示仍未完成。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "peer_workflow_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub scorer_submission_uuid: String,
    pub submission_uuid: String,
    pub started_at: i64,
    pub assessment_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_checkout(self) -> crate::models::assessments::entities::PeerCheckout {
        use crate::models::assessments::entities::PeerCheckout;
        use chrono::{DateTime, Utc};

        PeerCheckout {
            scorer_submission_uuid: self.scorer_submission_uuid,
            submission_uuid: self.submission_uuid,
            started_at: DateTime::<Utc>::from_timestamp(self.started_at, 0).unwrap_or_default(),
            assessment_id: self.assessment_id,
        }
    }
}
