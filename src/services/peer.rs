//! 互评：分配待评提交、创建互评、推进双方工作流

use chrono::Utc;
use tracing::{debug, info};

use super::AssessmentService;
use super::allocation::{SelectionRules, select_candidate};
use crate::errors::{AssessmentError, Result};
use crate::models::assessments::entities::{Assessment, NewAssessment};
use crate::models::assessments::requests::{CreateAssessment, PeerAssessRequest};
use crate::models::rubrics::entities::Rubric;
use crate::models::steps::entities::StepName;
use crate::models::submissions::entities::Submission;
use crate::scoring::parts_from_selection;
use crate::validation::validate_rubric;

impl AssessmentService {
    /// 为评估者分配下一份待评提交
    ///
    /// 评估者尚未完成的领取仍然有效时优先返回该提交；
    /// 没有可分配的提交时返回 `None`，表示需要等待更多提交。
    pub async fn get_submission_to_assess(
        &self,
        requesting_submission_uuid: &str,
        required_num_assessments: u32,
        over_grading_allowed: Option<bool>,
    ) -> Result<Option<Submission>> {
        let requester = self.require_submission(requesting_submission_uuid).await?;
        self.ensure_step_open(requesting_submission_uuid, StepName::Peer)
            .await?;
        let rules = SelectionRules {
            required: required_num_assessments,
            over_grading_allowed: over_grading_allowed
                .unwrap_or(self.policy().over_grading_allowed),
            tie_window: self.policy().tie_window,
            checkout_timeout: self.policy().checkout_timeout,
        };

        let candidates = self.storage().list_peer_candidates(&requester).await?;

        // 继续评估者尚未完成的领取
        if let Some(open) = self
            .storage()
            .get_open_checkout(requesting_submission_uuid)
            .await?
            && let Some(resumed) = candidates
                .iter()
                .find(|c| c.submission.uuid == open.submission_uuid && rules.is_eligible(c))
        {
            debug!(
                scorer_submission_uuid = requesting_submission_uuid,
                submission_uuid = %resumed.submission.uuid,
                "Resuming open peer checkout"
            );
            self.storage()
                .start_peer_checkout(requesting_submission_uuid, &resumed.submission.uuid)
                .await?;
            return Ok(Some(resumed.submission.clone()));
        }

        let now = Utc::now();
        let Some(chosen) = self.with_rng(|rng| select_candidate(candidates, &rules, now, rng))
        else {
            debug!(
                scorer_submission_uuid = requesting_submission_uuid,
                "No submission available for peer assessment"
            );
            return Ok(None);
        };

        self.storage()
            .start_peer_checkout(requesting_submission_uuid, &chosen.submission.uuid)
            .await?;
        debug!(
            scorer_submission_uuid = requesting_submission_uuid,
            submission_uuid = %chosen.submission.uuid,
            assessment_count = chosen.assessment_count,
            "Allocated submission for peer assessment"
        );

        Ok(Some(chosen.submission))
    }

    /// 评估者是否已完成所需数量的互评，同时返回已完成数量
    pub async fn has_finished_required_evaluating(
        &self,
        submission_uuid: &str,
        required_assessments: u32,
    ) -> Result<(bool, u32)> {
        let count = self
            .storage()
            .count_assessments_by_scorer(submission_uuid, StepName::Peer)
            .await?;
        Ok((count >= required_assessments, count))
    }

    /// 创建互评
    ///
    /// 所选选项必须与评分标准完全对应；评估者不能评估自己的提交，也不能重复评估。
    /// 提交收到的互评首次达到 `required_count` 时在同一事务中写入得分。
    pub async fn create_assessment(
        &self,
        input: CreateAssessment,
        rubric: &Rubric,
        required_count: u32,
    ) -> Result<Assessment> {
        let outcome = validate_rubric(rubric, None, false);
        if !outcome.success {
            return Err(AssessmentError::request(outcome.message));
        }

        let target = self.require_submission(&input.submission_uuid).await?;
        if input.submission_uuid == input.scorer_submission_uuid
            || target.student_item.student_id == input.scorer_id
        {
            return Err(AssessmentError::request(
                "Students cannot assess their own submission",
            ));
        }
        self.ensure_step_open(&input.scorer_submission_uuid, StepName::Peer)
            .await?;
        self.ensure_rubric_unchanged(&target, rubric).await?;

        let parts = parts_from_selection(
            rubric,
            &input.options_selected,
            &input.criterion_feedback,
        )?;

        let (assessment, score) = self
            .storage()
            .create_assessment(
                NewAssessment {
                    submission_uuid: input.submission_uuid,
                    scorer_id: input.scorer_id,
                    scorer_submission_uuid: input.scorer_submission_uuid,
                    score_type: StepName::Peer,
                    rubric: rubric.clone(),
                    feedback: input.overall_feedback,
                    parts,
                    scored_at: Utc::now(),
                },
                Some(required_count.max(1)),
            )
            .await?;

        if let Some(score) = score {
            info!(
                submission_uuid = %score.submission_uuid,
                points_earned = score.points_earned,
                points_possible = score.points_possible,
                "Peer score recorded"
            );
        }

        Ok(assessment)
    }

    /// 提交互评并推进被评提交和评估者自己的工作流
    ///
    /// 得分所需的互评数量取自被评提交工作流中的互评要求。
    /// 失败时按层级记录日志；工作流推进失败统一归为工作流错误。
    pub async fn peer_assess(&self, req: PeerAssessRequest) -> Result<Assessment> {
        let scorer_submission_uuid = req.assessment.scorer_submission_uuid.clone();

        let required = self
            .peer_requirements(&req.assessment.submission_uuid)
            .await
            .inspect_err(|e| e.report("Peer assessment failed"))?
            .must_be_graded_by;

        let assessment = self
            .create_assessment(req.assessment, &req.rubric, required)
            .await
            .inspect_err(|e| e.report("Peer assessment failed"))?;

        for submission_uuid in [
            assessment.submission_uuid.as_str(),
            scorer_submission_uuid.as_str(),
        ] {
            self.update_workflow_status(submission_uuid)
                .await
                .map_err(AssessmentError::into_workflow)
                .inspect_err(|e| e.report("Workflow update after peer assessment failed"))?;
        }

        Ok(assessment)
    }
}
