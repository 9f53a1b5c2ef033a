use std::sync::Arc;

use crate::models::{
    SubmissionCursor, SubmissionPage,
    assessments::entities::{Assessment, NewAssessment, PeerCandidate, PeerCheckout},
    rubrics::entities::Rubric,
    steps::entities::{AssessmentStepConfig, StepName},
    submissions::entities::{Score, StudentItem, Submission},
    workflows::entities::{Workflow, WorkflowStatus},
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 提交存储协作者
///
/// 评估引擎只通过该接口读写提交与得分，不关心提交的具体存储方式。
#[async_trait::async_trait]
pub trait SubmissionStore: Send + Sync {
    // 创建提交
    async fn create_submission(
        &self,
        student_item: StudentItem,
        answer: serde_json::Value,
    ) -> Result<Submission>;
    // 通过 UUID 获取提交及其学生信息
    async fn get_submission_and_student(&self, uuid: &str) -> Result<Option<Submission>>;
    // 获取提交的最新得分
    async fn get_latest_score_for_submission(&self, uuid: &str) -> Result<Option<Score>>;
    // 写入提交得分
    async fn set_score(&self, uuid: &str, points_earned: i32, points_possible: i32)
    -> Result<Score>;
    // 按 (created_at, uuid) 游标分页列出同一题目的提交
    async fn list_submissions(
        &self,
        course_id: &str,
        item_id: &str,
        cursor: Option<&SubmissionCursor>,
        limit: u64,
    ) -> Result<SubmissionPage>;
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 互评分配方法
    // 列出可供评估者评估的候选提交（已排除本人提交和已评估过的提交）
    async fn list_peer_candidates(&self, requester: &Submission) -> Result<Vec<PeerCandidate>>;
    // 获取评估者最近一条未完成的领取记录
    async fn get_open_checkout(&self, scorer_submission_uuid: &str)
    -> Result<Option<PeerCheckout>>;
    // 记录领取
    async fn start_peer_checkout(
        &self,
        scorer_submission_uuid: &str,
        submission_uuid: &str,
    ) -> Result<PeerCheckout>;

    /// 评估方法
    // 统计评估者完成的评估数量
    async fn count_assessments_by_scorer(
        &self,
        scorer_submission_uuid: &str,
        score_type: StepName,
    ) -> Result<u32>;
    // 统计提交收到的评估数量
    async fn count_assessments_for_submission(
        &self,
        submission_uuid: &str,
        score_type: StepName,
    ) -> Result<u32>;
    // 列出提交收到的评估（从新到旧）
    async fn list_assessments_for_submission(
        &self,
        submission_uuid: &str,
        score_type: StepName,
    ) -> Result<Vec<Assessment>>;
    // 在单个事务中保存评估；给出 `required` 时，评估数量足够且尚无得分则同时写入得分
    async fn create_assessment(
        &self,
        assessment: NewAssessment,
        required: Option<u32>,
    ) -> Result<(Assessment, Option<Score>)>;
    // 获取同一题目最近一次评估使用的评分标准
    async fn get_item_rubric(&self, course_id: &str, item_id: &str) -> Result<Option<Rubric>>;

    /// 工作流方法
    // 创建工作流及其步骤
    async fn create_workflow(
        &self,
        submission: &Submission,
        steps: &AssessmentStepConfig,
    ) -> Result<Workflow>;
    // 通过提交 UUID 获取工作流
    async fn get_workflow(&self, submission_uuid: &str) -> Result<Option<Workflow>>;
    // 保存工作流状态与步骤完成时间
    async fn save_workflow_progress(&self, workflow: &Workflow) -> Result<Workflow>;
    // 按状态统计同一题目的工作流数量
    async fn count_workflows_by_status(
        &self,
        course_id: &str,
        item_id: &str,
    ) -> Result<Vec<(WorkflowStatus, u64)>>;
}

/// 创建存储实例，同一个 SeaORM 实现同时承担提交存储
pub async fn create_storage() -> Result<(Arc<dyn Storage>, Arc<dyn SubmissionStore>)> {
    let storage = Arc::new(sea_orm_storage::SeaOrmStorage::new_async().await?);
    Ok((storage.clone(), storage))
}
