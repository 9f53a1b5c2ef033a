//! 提交与得分存储操作

use super::SeaOrmStorage;
use crate::entity::scores::{
    ActiveModel as ScoreActiveModel, Column as ScoreColumn, Entity as Scores,
};
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{AssessmentError, Result};
use crate::models::{
    SubmissionCursor, SubmissionPage,
    submissions::entities::{Score, StudentItem, Submission},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

impl SeaOrmStorage {
    /// 创建提交
    pub async fn create_submission_impl(
        &self,
        student_item: StudentItem,
        answer: serde_json::Value,
    ) -> Result<Submission> {
        // 微秒精度，同一秒内的提交仍按先后排序
        let now = chrono::Utc::now().timestamp_micros();

        let model = ActiveModel {
            uuid: Set(uuid::Uuid::new_v4().to_string()),
            student_id: Set(student_item.student_id),
            course_id: Set(student_item.course_id),
            item_id: Set(student_item.item_id),
            answer: Set(serde_json::to_string(&answer)?),
            submitted_at: Set(now),
            created_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("创建提交失败: {e}")))?;

        result.into_submission()
    }

    /// 通过 UUID 获取提交
    pub async fn get_submission_impl(&self, uuid: &str) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(uuid.to_string())
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询提交失败: {e}")))?;

        result.map(|m| m.into_submission()).transpose()
    }

    /// 获取提交的最新得分
    pub async fn get_latest_score_impl(&self, uuid: &str) -> Result<Option<Score>> {
        let result = Scores::find()
            .filter(ScoreColumn::SubmissionUuid.eq(uuid))
            .order_by_desc(ScoreColumn::CreatedAt)
            .order_by_desc(ScoreColumn::Id)
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询得分失败: {e}")))?;

        Ok(result.map(|m| m.into_score()))
    }

    /// 写入得分
    pub async fn set_score_impl(
        &self,
        uuid: &str,
        points_earned: i32,
        points_possible: i32,
    ) -> Result<Score> {
        let model = ScoreActiveModel {
            submission_uuid: Set(uuid.to_string()),
            points_earned: Set(points_earned),
            points_possible: Set(points_possible),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("写入得分失败: {e}")))?;

        Ok(result.into_score())
    }

    /// 按 (created_at, uuid) 游标分页列出提交
    pub async fn list_submissions_impl(
        &self,
        course_id: &str,
        item_id: &str,
        cursor: Option<&SubmissionCursor>,
        limit: u64,
    ) -> Result<SubmissionPage> {
        let limit = limit.clamp(1, 100);

        let mut select = Submissions::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ItemId.eq(item_id));

        // 严格位于游标之后
        if let Some(cursor) = cursor {
            select = select.filter(
                Condition::any()
                    .add(Column::CreatedAt.gt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(Column::CreatedAt.eq(cursor.created_at))
                            .add(Column::Uuid.gt(cursor.uuid.clone())),
                    ),
            );
        }

        // 多取一条用于判断是否还有下一页
        let mut rows = select
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Uuid)
            .limit(limit + 1)
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询提交列表失败: {e}")))?;

        let has_more = rows.len() as u64 > limit;
        rows.truncate(limit as usize);

        let items = rows
            .into_iter()
            .map(|m| m.into_submission())
            .collect::<Result<Vec<_>>>()?;

        let next_cursor = if has_more {
            items
                .last()
                .map(|last| SubmissionCursor::after(last).encode())
        } else {
            None
        };

        Ok(SubmissionPage { items, next_cursor })
    }
}
