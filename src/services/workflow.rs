//! 工作流状态机
//!
//! 状态只由步骤完成事件推进：`waiting_to_start` → 各步骤 → `waiting` → `done`。
//! 步骤完成时间一经写入不再清除，因此状态只会前进；`done` 为终态。

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::AssessmentService;
use crate::errors::{AssessmentError, Result};
use crate::models::steps::entities::{AssessmentStepConfig, PeerRequirements, StepName, StepSpec};
use crate::models::submissions::entities::{Score, Submission};
use crate::models::workflows::entities::{Workflow, WorkflowStatus, WorkflowStep};
use crate::models::workflows::responses::{StatusCount, StepStatusDetail, WorkflowStatusInfo};
use crate::scoring::score_from_assessments;
use crate::validation::DateStatus;

// 旧数据缺少互评要求时按最低要求处理
const DEFAULT_PEER_REQUIREMENTS: PeerRequirements = PeerRequirements {
    must_grade: 1,
    must_be_graded_by: 1,
};

/// 单个步骤当前满足的完成条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepProgress {
    // 提交者已完成本步骤的任务
    pub submitter_done: bool,
    // 提交已获得本步骤所需的评估
    pub assessed: bool,
}

/// 写入新满足的完成时间并重新计算状态，返回工作流是否发生变化
///
/// 状态为第一个提交者尚未完成的步骤；全部完成后为 `waiting`。
/// `done` 需要得分，由调用方在确认得分后设置。
pub fn apply_progress(
    workflow: &mut Workflow,
    progress: &[StepProgress],
    now: DateTime<Utc>,
) -> bool {
    let mut changed = false;

    for (step, progress) in workflow.steps.iter_mut().zip(progress) {
        if progress.submitter_done && step.submitter_completed_at.is_none() {
            step.submitter_completed_at = Some(now);
            changed = true;
        }
        if progress.assessed && step.assessment_completed_at.is_none() {
            step.assessment_completed_at = Some(now);
            changed = true;
        }
    }

    let next = workflow
        .steps
        .iter()
        .find(|step| step.submitter_completed_at.is_none())
        .map(|step| WorkflowStatus::from(step.name))
        .unwrap_or(WorkflowStatus::Waiting);

    if next != workflow.status {
        workflow.status = next;
        changed = true;
    }

    changed
}

fn status_details(workflow: &Workflow) -> BTreeMap<StepName, StepStatusDetail> {
    workflow
        .steps
        .iter()
        .map(|step| {
            (
                step.name,
                StepStatusDetail {
                    complete: step.submitter_completed_at.is_some(),
                    scored: step.assessment_completed_at.is_some(),
                },
            )
        })
        .collect()
}

impl AssessmentService {
    /// 为已有提交创建工作流
    pub async fn create_workflow(
        &self,
        submission_uuid: &str,
        steps: &[StepSpec],
    ) -> Result<WorkflowStatusInfo> {
        let steps = AssessmentStepConfig::new(steps)?;
        let submission = self.require_submission(submission_uuid).await?;
        self.start_workflow(&submission, &steps).await
    }

    /// 持久化 `waiting_to_start` 工作流后立即推进到第一个步骤
    pub(crate) async fn start_workflow(
        &self,
        submission: &Submission,
        steps: &AssessmentStepConfig,
    ) -> Result<WorkflowStatusInfo> {
        let workflow = self.storage().create_workflow(submission, steps).await?;
        info!(
            workflow_uuid = %workflow.uuid,
            submission_uuid = %submission.uuid,
            steps = ?steps.step_names(),
            "Workflow created"
        );

        self.update_workflow_status(&submission.uuid).await
    }

    async fn require_workflow(&self, submission_uuid: &str) -> Result<Workflow> {
        self.storage()
            .get_workflow(submission_uuid)
            .await?
            .ok_or_else(|| {
                AssessmentError::not_found(format!(
                    "No workflow exists for submission {submission_uuid}"
                ))
            })
    }

    /// 提交工作流中的互评要求，没有工作流或未配置互评时返回请求错误
    pub(crate) async fn peer_requirements(
        &self,
        submission_uuid: &str,
    ) -> Result<PeerRequirements> {
        let workflow = self
            .storage()
            .get_workflow(submission_uuid)
            .await?
            .ok_or_else(|| {
                AssessmentError::request(format!("Submission {submission_uuid} has no workflow"))
            })?;
        workflow
            .step(StepName::Peer)
            .map(|step| step.requirements.unwrap_or(DEFAULT_PEER_REQUIREMENTS))
            .ok_or_else(|| {
                AssessmentError::request(format!(
                    "Submission {submission_uuid} is not configured for peer assessment"
                ))
            })
    }

    /// 步骤不在开放时间内时拒绝请求，没有工作流或未配置该步骤时不受限制
    pub(crate) async fn ensure_step_open(
        &self,
        submission_uuid: &str,
        name: StepName,
    ) -> Result<()> {
        let Some(workflow) = self.storage().get_workflow(submission_uuid).await? else {
            return Ok(());
        };
        let Some(step) = workflow.step(name) else {
            return Ok(());
        };
        match step.window.status_at(Utc::now()) {
            DateStatus::Open => Ok(()),
            DateStatus::NotStarted => Err(AssessmentError::request(format!(
                "The {name} step is not open yet"
            ))),
            DateStatus::Closed => Err(AssessmentError::request(format!(
                "The {name} step has closed"
            ))),
        }
    }

    /// 查询工作流状态（只读）
    pub async fn get_workflow_status(&self, submission_uuid: &str) -> Result<WorkflowStatusInfo> {
        let workflow = self.require_workflow(submission_uuid).await?;
        let score = self
            .submission_store()
            .get_latest_score_for_submission(submission_uuid)
            .await?;
        Ok(Self::status_info(&workflow, score))
    }

    fn status_info(workflow: &Workflow, score: Option<Score>) -> WorkflowStatusInfo {
        WorkflowStatusInfo {
            submission_uuid: workflow.submission_uuid.clone(),
            status: workflow.status,
            status_details: status_details(workflow),
            score,
        }
    }

    /// 根据当前评估情况推进工作流
    ///
    /// 幂等：没有新的完成事件时不写入任何数据。`done` 状态直接返回。
    pub async fn update_workflow_status(
        &self,
        submission_uuid: &str,
    ) -> Result<WorkflowStatusInfo> {
        let mut workflow = self.require_workflow(submission_uuid).await?;

        if workflow.status.is_terminal() {
            return self.get_workflow_status(submission_uuid).await;
        }

        let mut progress = Vec::with_capacity(workflow.steps.len());
        for step in &workflow.steps {
            progress.push(self.step_progress(submission_uuid, step).await?);
        }

        let previous = workflow.status;
        let mut changed = apply_progress(&mut workflow, &progress, Utc::now());

        let mut score = None;
        let all_assessed = workflow
            .steps
            .iter()
            .all(|step| step.assessment_completed_at.is_some());
        if workflow.status == WorkflowStatus::Waiting && all_assessed {
            score = self.ensure_score(&workflow).await?;
            if score.is_some() {
                workflow.status = WorkflowStatus::Done;
                changed = true;
            }
        }

        if changed {
            workflow = self.storage().save_workflow_progress(&workflow).await?;
            if workflow.status != previous {
                info!(
                    submission_uuid,
                    from = %previous,
                    to = %workflow.status,
                    "Workflow status changed"
                );
            }
        } else {
            debug!(submission_uuid, status = %workflow.status, "Workflow unchanged");
        }

        let score = match score {
            Some(score) => Some(score),
            None => {
                self.submission_store()
                    .get_latest_score_for_submission(submission_uuid)
                    .await?
            }
        };

        Ok(Self::status_info(&workflow, score))
    }

    async fn step_progress(
        &self,
        submission_uuid: &str,
        step: &WorkflowStep,
    ) -> Result<StepProgress> {
        match step.name {
            StepName::Peer => {
                let requirements = step.requirements.unwrap_or(DEFAULT_PEER_REQUIREMENTS);
                let graded = self
                    .storage()
                    .count_assessments_by_scorer(submission_uuid, StepName::Peer)
                    .await?;
                let received = self
                    .storage()
                    .count_assessments_for_submission(submission_uuid, StepName::Peer)
                    .await?;
                Ok(StepProgress {
                    submitter_done: graded >= requirements.must_grade,
                    assessed: received >= requirements.must_be_graded_by,
                })
            }
            StepName::SelfAssessment => {
                let done = self
                    .storage()
                    .count_assessments_for_submission(submission_uuid, StepName::SelfAssessment)
                    .await?
                    >= 1;
                Ok(StepProgress {
                    submitter_done: done,
                    assessed: done,
                })
            }
        }
    }

    /// 确保提交有得分
    ///
    /// 已有得分时原样返回；否则配置了互评步骤时取互评得分，否则取自评得分。
    async fn ensure_score(&self, workflow: &Workflow) -> Result<Option<Score>> {
        let submission_uuid = workflow.submission_uuid.as_str();
        if let Some(score) = self
            .submission_store()
            .get_latest_score_for_submission(submission_uuid)
            .await?
        {
            return Ok(Some(score));
        }

        let (score_type, required) = match workflow.step(StepName::Peer) {
            Some(step) => (
                StepName::Peer,
                step.requirements
                    .unwrap_or(DEFAULT_PEER_REQUIREMENTS)
                    .must_be_graded_by,
            ),
            None => (StepName::SelfAssessment, 1),
        };

        let assessments = self
            .storage()
            .list_assessments_for_submission(submission_uuid, score_type)
            .await?;
        let Some(value) = score_from_assessments(&assessments, required as usize) else {
            return Ok(None);
        };

        let score = self
            .submission_store()
            .set_score(submission_uuid, value.points_earned, value.points_possible)
            .await?;
        info!(
            submission_uuid,
            score_type = %score_type,
            points_earned = score.points_earned,
            points_possible = score.points_possible,
            "Score recorded"
        );

        Ok(Some(score))
    }

    /// 统计同一题目下各状态的工作流数量
    ///
    /// 结果依次包含 `waiting_to_start`、各配置步骤、`waiting`、`done`，没有工作流的状态计为 0。
    pub async fn get_status_counts(
        &self,
        course_id: &str,
        item_id: &str,
        steps: &[StepName],
    ) -> Result<Vec<StatusCount>> {
        let counts: HashMap<WorkflowStatus, u64> = self
            .storage()
            .count_workflows_by_status(course_id, item_id)
            .await?
            .into_iter()
            .collect();

        let statuses = std::iter::once(WorkflowStatus::WaitingToStart)
            .chain(steps.iter().map(|step| WorkflowStatus::from(*step)))
            .chain([WorkflowStatus::Waiting, WorkflowStatus::Done]);

        Ok(statuses
            .map(|status| StatusCount {
                status,
                count: counts.get(&status).copied().unwrap_or(0),
            })
            .collect())
    }
}
