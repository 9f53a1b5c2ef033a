//! 工作流存储操作

use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::workflow_steps::{
    ActiveModel as StepActiveModel, Column as StepColumn, Entity as WorkflowSteps,
};
use crate::entity::workflows::{ActiveModel, Column, Entity as Workflows};
use crate::errors::{AssessmentError, Result};
use crate::models::{
    steps::entities::{AssessmentStepConfig, StepConfig},
    submissions::entities::Submission,
    workflows::entities::{Workflow, WorkflowStatus},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 读取工作流及其步骤
    async fn load_workflow<C: ConnectionTrait>(
        conn: &C,
        submission_uuid: &str,
    ) -> Result<Option<Workflow>> {
        let Some(workflow) = Workflows::find()
            .filter(Column::SubmissionUuid.eq(submission_uuid))
            .one(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询工作流失败: {e}")))?
        else {
            return Ok(None);
        };

        let steps = WorkflowSteps::find()
            .filter(StepColumn::WorkflowId.eq(workflow.id))
            .order_by_asc(StepColumn::OrderNum)
            .all(conn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("查询工作流步骤失败: {e}")))?;

        workflow.into_workflow(steps).map(Some)
    }

    /// 创建工作流及其步骤，初始状态为 `waiting_to_start`
    pub async fn create_workflow_impl(
        &self,
        submission: &Submission,
        steps: &AssessmentStepConfig,
    ) -> Result<Workflow> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("开启事务失败: {e}")))?;

        let workflow = ActiveModel {
            uuid: Set(uuid::Uuid::new_v4().to_string()),
            submission_uuid: Set(submission.uuid.clone()),
            course_id: Set(submission.student_item.course_id.clone()),
            item_id: Set(submission.student_item.item_id.clone()),
            status: Set(WorkflowStatus::WaitingToStart.as_str().to_string()),
            created_at: Set(now),
            modified_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AssessmentError::request(format!(
                    "A workflow already exists for submission {}",
                    submission.uuid
                ))
            } else {
                AssessmentError::database_operation(format!("创建工作流失败: {e}"))
            }
        })?;

        let mut step_models = Vec::with_capacity(steps.steps().len());
        for (order_num, step) in steps.steps().iter().enumerate() {
            let (must_grade, must_be_graded_by) = match step.config {
                StepConfig::Peer(req) => (
                    Some(req.must_grade as i32),
                    Some(req.must_be_graded_by as i32),
                ),
                StepConfig::SelfAssessment => (None, None),
            };

            let model = StepActiveModel {
                workflow_id: Set(workflow.id),
                name: Set(step.config.name().as_str().to_string()),
                order_num: Set(order_num as i32),
                must_grade: Set(must_grade),
                must_be_graded_by: Set(must_be_graded_by),
                start_at: Set(step.window.start.map(|t| t.timestamp())),
                due_at: Set(step.window.due.map(|t| t.timestamp())),
                submitter_completed_at: Set(None),
                assessment_completed_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("创建工作流步骤失败: {e}")))?;
            step_models.push(model);
        }

        txn.commit()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("提交事务失败: {e}")))?;

        workflow.into_workflow(step_models)
    }

    /// 通过提交 UUID 获取工作流
    pub async fn get_workflow_impl(&self, submission_uuid: &str) -> Result<Option<Workflow>> {
        Self::load_workflow(&self.db, submission_uuid).await
    }

    /// 保存工作流状态与各步骤完成时间
    ///
    /// 写入均带条件：状态只从更早的状态前进，完成时间只在为空时写入。
    /// 基于旧快照的并发保存因此不会让工作流倒退，也不会清除已有的完成时间。
    pub async fn save_workflow_progress_impl(&self, workflow: &Workflow) -> Result<Workflow> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("开启事务失败: {e}")))?;

        let earlier: Vec<&str> = workflow
            .status
            .preceding()
            .iter()
            .map(|status| status.as_str())
            .collect();
        if !earlier.is_empty() {
            Workflows::update_many()
                .col_expr(Column::Status, Expr::value(workflow.status.as_str()))
                .col_expr(Column::ModifiedAt, Expr::value(chrono::Utc::now().timestamp()))
                .filter(Column::Id.eq(workflow.id))
                .filter(Column::Status.is_in(earlier))
                .exec(&txn)
                .await
                .map_err(|e| AssessmentError::database_operation(format!("更新工作流失败: {e}")))?;
        }

        for step in &workflow.steps {
            let stamps = [
                (StepColumn::SubmitterCompletedAt, step.submitter_completed_at),
                (StepColumn::AssessmentCompletedAt, step.assessment_completed_at),
            ];
            for (column, completed_at) in stamps {
                let Some(completed_at) = completed_at else {
                    continue;
                };
                WorkflowSteps::update_many()
                    .col_expr(column, Expr::value(completed_at.timestamp()))
                    .filter(StepColumn::Id.eq(step.id))
                    .filter(column.is_null())
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        AssessmentError::database_operation(format!("更新工作流步骤失败: {e}"))
                    })?;
            }
        }

        let saved = Self::load_workflow(&txn, &workflow.submission_uuid)
            .await?
            .ok_or_else(|| {
                AssessmentError::workflow(format!(
                    "Workflow for submission {} disappeared while saving",
                    workflow.submission_uuid
                ))
            })?;

        txn.commit()
            .await
            .map_err(|e| AssessmentError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(saved)
    }

    /// 按状态统计同一题目的工作流数量
    pub async fn count_workflows_by_status_impl(
        &self,
        course_id: &str,
        item_id: &str,
    ) -> Result<Vec<(WorkflowStatus, u64)>> {
        let rows = Workflows::find()
            .select_only()
            .column(Column::Status)
            .column_as(Column::Id.count(), "count")
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ItemId.eq(item_id))
            .group_by(Column::Status)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("统计工作流状态失败: {e}")))?;

        rows.into_iter()
            .map(|(status, count)| Ok((status.parse()?, count.max(0) as u64)))
            .collect()
    }
}
