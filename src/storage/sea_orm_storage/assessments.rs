//! 评估存储操作

use std::collections::HashMap;

use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::assessment_parts::{
    ActiveModel as PartActiveModel, Column as PartColumn, Entity as AssessmentParts,
};
use crate::entity::assessments::{ActiveModel, Column, Entity as Assessments, Model};
use crate::entity::peer_workflow_items::{
    ActiveModel as ItemActiveModel, Column as ItemColumn, Entity as PeerWorkflowItems,
};
use crate::entity::scores::{
    ActiveModel as ScoreActiveModel, Column as ScoreColumn, Entity as Scores,
};
use crate::errors::{AssessmentError, Result};
use crate::models::{
    assessments::entities::{Assessment, AssessmentPart, NewAssessment},
    steps::entities::StepName,
    submissions::entities::Score,
};
use crate::scoring::score_from_assessments;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;

impl SeaOrmStorage {
    /// 补全评估明细与评分标准哈希
    async fn load_assessments<C: ConnectionTrait>(
        conn: &C,
        models: Vec<Model>,
    ) -> Result<Vec<Assessment>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = models.iter().map(|m| m.id).collect();
        let rubric_ids: Vec<i64> = models.iter().map(|m| m.rubric_id).collect();

        let parts = AssessmentParts::find()
            .filter(PartColumn::AssessmentId.is_in(ids))
            .order_by_asc(PartColumn::Id)
            .all(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询评估明细失败: {e}")))?;

        let mut parts_by_assessment: HashMap<i64, Vec<AssessmentPart>> = HashMap::new();
        for part in parts {
            parts_by_assessment
                .entry(part.assessment_id)
                .or_default()
                .push(part.into_part());
        }

        let hashes = Self::rubric_hashes(conn, rubric_ids).await?;

        models
            .into_iter()
            .map(|model| {
                let parts = parts_by_assessment.remove(&model.id).unwrap_or_default();
                let rubric_hash = hashes.get(&model.rubric_id).cloned().unwrap_or_default();
                model.into_assessment(rubric_hash, parts)
            })
            .collect()
    }

    /// 按时间从新到旧列出提交收到的评估
    async fn find_assessments_for_submission<C: ConnectionTrait>(
        conn: &C,
        submission_uuid: &str,
        score_type: StepName,
    ) -> Result<Vec<Assessment>> {
        let models = Assessments::find()
            .filter(Column::SubmissionUuid.eq(submission_uuid))
            .filter(Column::ScoreType.eq(score_type.as_str()))
            .order_by_desc(Column::ScoredAt)
            .order_by_desc(Column::Id)
            .all(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询评估列表失败: {e}")))?;

        Self::load_assessments(conn, models).await
    }

    /// 统计评估者完成的评估数量
    pub async fn count_assessments_by_scorer_impl(
        &self,
        scorer_submission_uuid: &str,
        score_type: StepName,
    ) -> Result<u32> {
        let count = Assessments::find()
            .filter(Column::ScorerSubmissionUuid.eq(scorer_submission_uuid))
            .filter(Column::ScoreType.eq(score_type.as_str()))
            .count(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("统计评估数量失败: {e}")))?;

        Ok(count as u32)
    }

    /// 统计提交收到的评估数量
    pub async fn count_assessments_for_submission_impl(
        &self,
        submission_uuid: &str,
        score_type: StepName,
    ) -> Result<u32> {
        let count = Assessments::find()
            .filter(Column::SubmissionUuid.eq(submission_uuid))
            .filter(Column::ScoreType.eq(score_type.as_str()))
            .count(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("统计评估数量失败: {e}")))?;

        Ok(count as u32)
    }

    /// 列出提交收到的评估
    pub async fn list_assessments_for_submission_impl(
        &self,
        submission_uuid: &str,
        score_type: StepName,
    ) -> Result<Vec<Assessment>> {
        Self::find_assessments_for_submission(&self.db, submission_uuid, score_type).await
    }

    /// 在单个事务中保存评估
    ///
    /// 依次写入评分标准、评估、评估明细，关闭对应的互评领取记录；
    /// 给出 `required` 且评估数量足够、提交尚无得分时写入得分。
    /// 任一步失败则整个事务回滚，不留下任何记录。
    pub async fn create_assessment_impl(
        &self,
        new: NewAssessment,
        required: Option<u32>,
    ) -> Result<(Assessment, Option<Score>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("开启事务失败: {e}")))?;

        let rubric_id = Self::ensure_rubric(&txn, &new.rubric).await?;
        let scored_at = new.scored_at.timestamp();

        let model = ActiveModel {
            submission_uuid: Set(new.submission_uuid.clone()),
            rubric_id: Set(rubric_id),
            scorer_id: Set(new.scorer_id.clone()),
            scorer_submission_uuid: Set(new.scorer_submission_uuid.clone()),
            score_type: Set(new.score_type.as_str().to_string()),
            feedback: Set(new.feedback.clone()),
            points_possible: Set(new.rubric.points_possible()),
            scored_at: Set(scored_at),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AssessmentError::request(format!(
                    "Submission {} has already been assessed by this scorer in the {} step",
                    new.submission_uuid, new.score_type
                ))
            } else {
                AssessmentError::database_operation(format!("创建评估失败: {e}"))
            }
        })?;

        for part in &new.parts {
            PartActiveModel {
                assessment_id: Set(model.id),
                criterion_name: Set(part.criterion_name.clone()),
                option_name: Set(part.option_name.clone()),
                points: Set(part.points),
                feedback: Set(part.feedback.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("创建评估明细失败: {e}")))?;
        }

        if new.score_type == StepName::Peer {
            Self::close_checkout(&txn, &new, model.id, scored_at).await?;
        }

        let score = match required {
            Some(required) => Self::score_if_sufficient(&txn, &new, required).await?,
            None => None,
        };

        let assessment = Model::into_assessment(
            model,
            new.rubric.content_hash(),
            new.parts.clone(),
        )?;

        txn.commit()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("提交事务失败: {e}")))?;

        info!(
            assessment_id = assessment.id,
            submission_uuid = %assessment.submission_uuid,
            score_type = %assessment.score_type,
            "Assessment created"
        );

        Ok((assessment, score))
    }

    /// 关闭评估者对该提交的领取记录，没有领取记录时补一条已完成的记录
    async fn close_checkout<C: ConnectionTrait>(
        conn: &C,
        new: &NewAssessment,
        assessment_id: i64,
        scored_at: i64,
    ) -> Result<()> {
        let open_items = PeerWorkflowItems::find()
            .filter(ItemColumn::ScorerSubmissionUuid.eq(new.scorer_submission_uuid.as_str()))
            .filter(ItemColumn::SubmissionUuid.eq(new.submission_uuid.as_str()))
            .filter(ItemColumn::AssessmentId.is_null())
            .all(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询领取记录失败: {e}")))?;

        if open_items.is_empty() {
            ItemActiveModel {
                scorer_submission_uuid: Set(new.scorer_submission_uuid.clone()),
                submission_uuid: Set(new.submission_uuid.clone()),
                started_at: Set(scored_at),
                assessment_id: Set(Some(assessment_id)),
                ..Default::default()
            }
            .insert(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("创建领取记录失败: {e}")))?;
            return Ok(());
        }

        for item in open_items {
            let mut active: ItemActiveModel = item.into();
            active.assessment_id = Set(Some(assessment_id));
            active
                .update(conn)
                .await
                .map_err(|e| AssessmentError::database_operation(format!("关闭领取记录失败: {e}")))?;
        }

        Ok(())
    }

    /// 评估数量首次达到要求时写入得分，已有得分则保持不变
    async fn score_if_sufficient<C: ConnectionTrait>(
        conn: &C,
        new: &NewAssessment,
        required: u32,
    ) -> Result<Option<Score>> {
        let existing = Scores::find()
            .filter(ScoreColumn::SubmissionUuid.eq(new.submission_uuid.as_str()))
            .count(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询得分失败: {e}")))?;
        if existing > 0 {
            return Ok(None);
        }

        let assessments =
            Self::find_assessments_for_submission(conn, &new.submission_uuid, new.score_type)
                .await?;
        let Some(value) = score_from_assessments(&assessments, required as usize) else {
            return Ok(None);
        };

        let score = ScoreActiveModel {
            submission_uuid: Set(new.submission_uuid.clone()),
            points_earned: Set(value.points_earned),
            points_possible: Set(value.points_possible),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| AssessmentError::database_operation(format!("写入得分失败: {e}")))?;

        info!(
            submission_uuid = %score.submission_uuid,
            points_earned = score.points_earned,
            points_possible = score.points_possible,
            "Score recorded from {} assessments",
            required
        );

        Ok(Some(score.into_score()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::rubrics::Entity as Rubrics;
    use crate::models::rubrics::entities::fixtures::{ideas_rubric, two_criteria_rubric};
    use crate::models::submissions::entities::{StudentItem, Submission};
    use serde_json::json;

    async fn submit(storage: &SeaOrmStorage, student_id: &str) -> Submission {
        storage
            .create_submission_impl(
                StudentItem {
                    student_id: student_id.to_string(),
                    item_id: "item-1".to_string(),
                    course_id: "course-1".to_string(),
                },
                json!("answer"),
            )
            .await
            .unwrap()
    }

    fn peer_assessment(scorer: &Submission, target: &Submission, points: i32) -> NewAssessment {
        let option = match points {
            0 => "Poor",
            3 => "Good",
            _ => "Excellent",
        };
        NewAssessment {
            submission_uuid: target.uuid.clone(),
            scorer_id: scorer.student_item.student_id.clone(),
            scorer_submission_uuid: scorer.uuid.clone(),
            score_type: StepName::Peer,
            rubric: ideas_rubric(),
            feedback: "ok".to_string(),
            parts: vec![AssessmentPart {
                criterion_name: "Ideas".to_string(),
                option_name: option.to_string(),
                points,
                feedback: String::new(),
            }],
            scored_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_assessment_records_parts_and_counts() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let alice = submit(&storage, "alice").await;
        let bob = submit(&storage, "bob").await;

        let (assessment, score) = storage
            .create_assessment_impl(peer_assessment(&bob, &alice, 3), Some(2))
            .await
            .unwrap();
        assert_eq!(assessment.points_earned, 3);
        assert_eq!(assessment.points_possible, 5);
        assert_eq!(assessment.rubric_hash, ideas_rubric().content_hash());
        assert!(score.is_none());

        assert_eq!(
            storage
                .count_assessments_by_scorer_impl(&bob.uuid, StepName::Peer)
                .await
                .unwrap(),
            1
        );
        let listed = storage
            .list_assessments_for_submission_impl(&alice.uuid, StepName::Peer)
            .await
            .unwrap();
        assert_eq!(listed, vec![assessment]);
    }

    #[tokio::test]
    async fn test_score_written_once_when_enough_assessments() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let alice = submit(&storage, "alice").await;
        let bob = submit(&storage, "bob").await;
        let carol = submit(&storage, "carol").await;
        let dave = submit(&storage, "dave").await;

        storage
            .create_assessment_impl(peer_assessment(&bob, &alice, 5), Some(2))
            .await
            .unwrap();
        let (_, score) = storage
            .create_assessment_impl(peer_assessment(&carol, &alice, 0), Some(2))
            .await
            .unwrap();
        let score = score.unwrap();
        // 中位数 (0 + 5) / 2 向上取整
        assert_eq!((score.points_earned, score.points_possible), (3, 5));

        // 后续评估不修改已有得分
        let (_, later) = storage
            .create_assessment_impl(peer_assessment(&dave, &alice, 0), Some(2))
            .await
            .unwrap();
        assert!(later.is_none());
        let latest = storage
            .get_latest_score_impl(&alice.uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.points_earned, 3);
    }

    #[tokio::test]
    async fn test_duplicate_assessment_rolls_back_everything() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let alice = submit(&storage, "alice").await;
        let bob = submit(&storage, "bob").await;

        storage
            .create_assessment_impl(peer_assessment(&bob, &alice, 3), Some(1))
            .await
            .unwrap();

        // 第二次评估使用新的评分标准，失败后该评分标准也不应留下
        let mut again = peer_assessment(&bob, &alice, 3);
        again.rubric = two_criteria_rubric();
        let err = storage
            .create_assessment_impl(again, Some(1))
            .await
            .unwrap_err();
        assert_eq!(err.tier(), crate::errors::ErrorTier::Request);

        let rubrics = Rubrics::find().count(&storage.db).await.unwrap();
        assert_eq!(rubrics, 1);
        assert_eq!(
            storage
                .count_assessments_for_submission_impl(&alice.uuid, StepName::Peer)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_nothing_visible() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let bob = submit(&storage, "bob").await;
        let ghost = Submission {
            uuid: "00000000-0000-0000-0000-000000000000".to_string(),
            ..bob.clone()
        };

        let err = storage
            .create_assessment_impl(peer_assessment(&bob, &ghost, 3), Some(1))
            .await
            .unwrap_err();
        assert_eq!(err.tier(), crate::errors::ErrorTier::Internal);

        assert_eq!(Rubrics::find().count(&storage.db).await.unwrap(), 0);
        assert_eq!(Assessments::find().count(&storage.db).await.unwrap(), 0);
        assert_eq!(PeerWorkflowItems::find().count(&storage.db).await.unwrap(), 0);
    }
}
