//! 评分标准存储操作
//!
//! 评分标准按内容哈希去重，评估只保存其 ID。

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::assessments::{Column as AssessmentColumn, Entity as Assessments};
use crate::entity::rubrics::{ActiveModel, Column, Entity as Rubrics};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{AssessmentError, Result};
use crate::models::rubrics::entities::Rubric;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Set,
};

impl SeaOrmStorage {
    /// 按哈希查找评分标准，不存在则创建，返回其 ID
    pub(crate) async fn ensure_rubric<C: ConnectionTrait>(
        conn: &C,
        rubric: &Rubric,
    ) -> Result<i64> {
        let content_hash = rubric.content_hash();

        let existing = Rubrics::find()
            .filter(Column::ContentHash.eq(content_hash.as_str()))
            .one(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询评分标准失败: {e}")))?;

        if let Some(model) = existing {
            return Ok(model.id);
        }

        let model = ActiveModel {
            content_hash: Set(content_hash),
            body: Set(serde_json::to_string(rubric)?),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("保存评分标准失败: {e}")))?;

        Ok(result.id)
    }

    /// 同一题目最近一次评估使用的评分标准，尚无评估时返回 `None`
    pub async fn get_item_rubric_impl(
        &self,
        course_id: &str,
        item_id: &str,
    ) -> Result<Option<Rubric>> {
        let item_submissions = Submissions::find()
            .select_only()
            .column(SubmissionColumn::Uuid)
            .filter(SubmissionColumn::CourseId.eq(course_id))
            .filter(SubmissionColumn::ItemId.eq(item_id))
            .into_query();

        let rubric_id = Assessments::find()
            .select_only()
            .column(AssessmentColumn::RubricId)
            .filter(AssessmentColumn::SubmissionUuid.in_subquery(item_submissions))
            .order_by_desc(AssessmentColumn::Id)
            .into_tuple::<i64>()
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询题目评分标准失败: {e}")))?;

        let Some(rubric_id) = rubric_id else {
            return Ok(None);
        };

        let model = Rubrics::find_by_id(rubric_id)
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询评分标准失败: {e}")))?
            .ok_or_else(|| AssessmentError::internal(format!("评分标准 {rubric_id} 不存在")))?;

        Ok(Some(serde_json::from_str(&model.body)?))
    }

    /// 批量获取评分标准哈希
    pub(crate) async fn rubric_hashes<C: ConnectionTrait>(
        conn: &C,
        ids: Vec<i64>,
    ) -> Result<HashMap<i64, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rubrics = Rubrics::find()
            .filter(Column::Id.is_in(ids))
            .all(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询评分标准失败: {e}")))?;

        Ok(rubrics
            .into_iter()
            .map(|model| (model.id, model.content_hash))
            .collect())
    }
}
