//! 互评候选与领取记录存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::assessments::{Column as AssessmentColumn, Entity as Assessments};
use crate::entity::peer_workflow_items::{ActiveModel, Column, Entity as PeerWorkflowItems};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{AssessmentError, Result};
use crate::models::{
    assessments::entities::{PeerCandidate, PeerCheckout},
    steps::entities::StepName,
    submissions::entities::Submission,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    Set,
};

impl SeaOrmStorage {
    /// 列出互评候选
    ///
    /// 同一课程和题目下的提交，排除评估者本人（按学生 ID）的提交和已评估过的提交，
    /// 按 (created_at, uuid) 升序返回。
    pub async fn list_peer_candidates_impl(
        &self,
        requester: &Submission,
    ) -> Result<Vec<PeerCandidate>> {
        let item = &requester.student_item;

        // 评估者已互评过的提交
        let assessed = Assessments::find()
            .select_only()
            .column(AssessmentColumn::SubmissionUuid)
            .filter(AssessmentColumn::ScorerSubmissionUuid.eq(requester.uuid.as_str()))
            .filter(AssessmentColumn::ScoreType.eq(StepName::Peer.as_str()))
            .into_query();

        let submissions = Submissions::find()
            .filter(SubmissionColumn::CourseId.eq(item.course_id.as_str()))
            .filter(SubmissionColumn::ItemId.eq(item.item_id.as_str()))
            .filter(SubmissionColumn::StudentId.ne(item.student_id.as_str()))
            .filter(SubmissionColumn::Uuid.not_in_subquery(assessed))
            .order_by_asc(SubmissionColumn::CreatedAt)
            .order_by_asc(SubmissionColumn::Uuid)
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询候选提交失败: {e}")))?;
        if submissions.is_empty() {
            return Ok(Vec::new());
        }

        // 同一题目的全部提交，聚合查询用子查询限定范围，不逐个绑定 UUID
        let pool = || {
            Submissions::find()
                .select_only()
                .column(SubmissionColumn::Uuid)
                .filter(SubmissionColumn::CourseId.eq(item.course_id.as_str()))
                .filter(SubmissionColumn::ItemId.eq(item.item_id.as_str()))
                .into_query()
        };

        // 各提交已收到的互评数量
        let counts: HashMap<String, i64> = Assessments::find()
            .select_only()
            .column(AssessmentColumn::SubmissionUuid)
            .column_as(AssessmentColumn::Id.count(), "count")
            .filter(AssessmentColumn::ScoreType.eq(StepName::Peer.as_str()))
            .filter(AssessmentColumn::SubmissionUuid.in_subquery(pool()))
            .group_by(AssessmentColumn::SubmissionUuid)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("统计互评数量失败: {e}")))?
            .into_iter()
            .collect();

        // 其他评估者尚未完成的领取，取每份提交最近的领取时间
        let checked_out: HashMap<String, i64> = PeerWorkflowItems::find()
            .select_only()
            .column(Column::SubmissionUuid)
            .column_as(Column::StartedAt.max(), "started_at")
            .filter(Column::SubmissionUuid.in_subquery(pool()))
            .filter(Column::ScorerSubmissionUuid.ne(requester.uuid.as_str()))
            .filter(Column::AssessmentId.is_null())
            .group_by(Column::SubmissionUuid)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询领取记录失败: {e}")))?
            .into_iter()
            .collect();

        submissions
            .into_iter()
            .map(|model| {
                let assessment_count =
                    counts.get(&model.uuid).copied().unwrap_or(0).max(0) as u32;
                let checked_out_at = checked_out
                    .get(&model.uuid)
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(*ts, 0));
                Ok(PeerCandidate {
                    submission: model.into_submission()?,
                    assessment_count,
                    checked_out_at,
                })
            })
            .collect()
    }

    /// 获取评估者最近一条未完成的领取记录
    pub async fn get_open_checkout_impl(
        &self,
        scorer_submission_uuid: &str,
    ) -> Result<Option<PeerCheckout>> {
        let result = PeerWorkflowItems::find()
            .filter(Column::ScorerSubmissionUuid.eq(scorer_submission_uuid))
            .filter(Column::AssessmentId.is_null())
            .order_by_desc(Column::StartedAt)
            .order_by_desc(Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询领取记录失败: {e}")))?;

        Ok(result.map(|m| m.into_checkout()))
    }

    /// 记录领取，已有未完成的同一领取则刷新领取时间
    pub async fn start_peer_checkout_impl(
        &self,
        scorer_submission_uuid: &str,
        submission_uuid: &str,
    ) -> Result<PeerCheckout> {
        let now = Utc::now().timestamp();

        let existing = PeerWorkflowItems::find()
            .filter(Column::ScorerSubmissionUuid.eq(scorer_submission_uuid))
            .filter(Column::SubmissionUuid.eq(submission_uuid))
            .filter(Column::AssessmentId.is_null())
            .one(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询领取记录失败: {e}")))?;

        let result = match existing {
            Some(model) => {
                let mut active: ActiveModel = model.into();
                active.started_at = Set(now);
                active.update(&self.db).await
            }
            None => {
                ActiveModel {
                    scorer_submission_uuid: Set(scorer_submission_uuid.to_string()),
                    submission_uuid: Set(submission_uuid.to_string()),
                    started_at: Set(now),
                    assessment_id: Set(None),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
            }
        }
        .map_err(|e| AssessmentError::database_operation(format!("保存领取记录失败: {e}")))?;

        Ok(result.into_checkout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessments::entities::{AssessmentPart, NewAssessment};
    use crate::models::rubrics::entities::fixtures::ideas_rubric;
    use crate::models::submissions::entities::StudentItem;
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

    fn assess(scorer: &Submission, target: &Submission) -> NewAssessment {
        NewAssessment {
            submission_uuid: target.uuid.clone(),
            scorer_id: scorer.student_item.student_id.clone(),
            scorer_submission_uuid: scorer.uuid.clone(),
            score_type: StepName::Peer,
            rubric: ideas_rubric(),
            feedback: String::new(),
            parts: vec![AssessmentPart {
                criterion_name: "Ideas".to_string(),
                option_name: "Good".to_string(),
                points: 3,
                feedback: String::new(),
            }],
            scored_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_candidates_exclude_own_and_already_assessed() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let alice = submit(&storage, "alice").await;
        let alice_again = submit(&storage, "alice").await;
        let bob = submit(&storage, "bob").await;
        let carol = submit(&storage, "carol").await;

        storage
            .create_assessment_impl(assess(&alice, &bob), None)
            .await
            .unwrap();

        let candidates = storage.list_peer_candidates_impl(&alice).await.unwrap();
        let uuids: Vec<_> = candidates.iter().map(|c| c.submission.uuid.as_str()).collect();
        assert_eq!(uuids, vec![carol.uuid.as_str()]);
        assert!(!uuids.contains(&alice_again.uuid.as_str()));

        // 其他评估者看到 bob 已有一份互评
        let candidates = storage.list_peer_candidates_impl(&carol).await.unwrap();
        let bob_candidate = candidates
            .iter()
            .find(|c| c.submission.uuid == bob.uuid)
            .unwrap();
        assert_eq!(bob_candidate.assessment_count, 1);
    }

    #[tokio::test]
    async fn test_checkout_is_closed_by_assessment() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let alice = submit(&storage, "alice").await;
        let bob = submit(&storage, "bob").await;
        let carol = submit(&storage, "carol").await;

        storage
            .start_peer_checkout_impl(&alice.uuid, &bob.uuid)
            .await
            .unwrap();
        let open = storage
            .get_open_checkout_impl(&alice.uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.submission_uuid, bob.uuid);
        assert!(open.is_open());

        // carol 看到 bob 正在被评估
        let candidates = storage.list_peer_candidates_impl(&carol).await.unwrap();
        let bob_candidate = candidates
            .iter()
            .find(|c| c.submission.uuid == bob.uuid)
            .unwrap();
        assert!(bob_candidate.checked_out_at.is_some());

        storage
            .create_assessment_impl(assess(&alice, &bob), None)
            .await
            .unwrap();
        assert!(storage.get_open_checkout_impl(&alice.uuid).await.unwrap().is_none());
    }
}
