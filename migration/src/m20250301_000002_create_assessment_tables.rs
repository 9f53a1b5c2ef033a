use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_submission_tables::Submissions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ==================== 评分标准表 ====================
        // 同一份评分标准按内容哈希去重
        manager
            .create_table(
                Table::create()
                    .table(Rubrics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rubrics::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Rubrics::ContentHash)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Rubrics::Body).text().not_null())
                    .col(ColumnDef::new(Rubrics::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // ==================== 评估表 ====================
        manager
            .create_table(
                Table::create()
                    .table(Assessments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assessments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Assessments::SubmissionUuid)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assessments::RubricId).big_integer().not_null())
                    .col(ColumnDef::new(Assessments::ScorerId).string().not_null())
                    .col(
                        ColumnDef::new(Assessments::ScorerSubmissionUuid)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assessments::ScoreType).string().not_null())
                    .col(ColumnDef::new(Assessments::Feedback).text().not_null())
                    .col(
                        ColumnDef::new(Assessments::PointsPossible)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assessments::ScoredAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Assessments::Table, Assessments::SubmissionUuid)
                            .to(Submissions::Table, Submissions::Uuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Assessments::Table, Assessments::RubricId)
                            .to(Rubrics::Table, Rubrics::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 评估明细表 ====================
        manager
            .create_table(
                Table::create()
                    .table(AssessmentParts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssessmentParts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssessmentParts::AssessmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssessmentParts::CriterionName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssessmentParts::OptionName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssessmentParts::Points).integer().not_null())
                    .col(ColumnDef::new(AssessmentParts::Feedback).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssessmentParts::Table, AssessmentParts::AssessmentId)
                            .to(Assessments::Table, Assessments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 互评领取记录表 ====================
        manager
            .create_table(
                Table::create()
                    .table(PeerWorkflowItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PeerWorkflowItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PeerWorkflowItems::ScorerSubmissionUuid)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerWorkflowItems::SubmissionUuid)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerWorkflowItems::StartedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PeerWorkflowItems::AssessmentId)
                            .big_integer()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 工作流表 ====================
        manager
            .create_table(
                Table::create()
                    .table(Workflows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Workflows::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Workflows::Uuid)
                            .string_len(36)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Workflows::SubmissionUuid)
                            .string_len(36)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Workflows::CourseId).string().not_null())
                    .col(ColumnDef::new(Workflows::ItemId).string().not_null())
                    .col(ColumnDef::new(Workflows::Status).string().not_null())
                    .col(ColumnDef::new(Workflows::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Workflows::ModifiedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Workflows::Table, Workflows::SubmissionUuid)
                            .to(Submissions::Table, Submissions::Uuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ==================== 工作流步骤表 ====================
        manager
            .create_table(
                Table::create()
                    .table(WorkflowSteps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkflowSteps::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WorkflowSteps::WorkflowId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WorkflowSteps::Name).string_len(20).not_null())
                    .col(ColumnDef::new(WorkflowSteps::OrderNum).integer().not_null())
                    .col(ColumnDef::new(WorkflowSteps::MustGrade).integer().null())
                    .col(
                        ColumnDef::new(WorkflowSteps::MustBeGradedBy)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(WorkflowSteps::StartAt).big_integer().null())
                    .col(ColumnDef::new(WorkflowSteps::DueAt).big_integer().null())
                    .col(
                        ColumnDef::new(WorkflowSteps::SubmitterCompletedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkflowSteps::AssessmentCompletedAt)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(WorkflowSteps::Table, WorkflowSteps::WorkflowId)
                            .to(Workflows::Table, Workflows::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一评分者在同一步骤中不能重复评估同一提交
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assessments_unique_scorer_step")
                    .table(Assessments::Table)
                    .col(Assessments::ScorerSubmissionUuid)
                    .col(Assessments::SubmissionUuid)
                    .col(Assessments::ScoreType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assessments_submission_uuid")
                    .table(Assessments::Table)
                    .col(Assessments::SubmissionUuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assessment_parts_assessment_id")
                    .table(AssessmentParts::Table)
                    .col(AssessmentParts::AssessmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_peer_workflow_items_scorer")
                    .table(PeerWorkflowItems::Table)
                    .col(PeerWorkflowItems::ScorerSubmissionUuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_peer_workflow_items_submission")
                    .table(PeerWorkflowItems::Table)
                    .col(PeerWorkflowItems::SubmissionUuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_workflows_course_item_status")
                    .table(Workflows::Table)
                    .col(Workflows::CourseId)
                    .col(Workflows::ItemId)
                    .col(Workflows::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_workflow_steps_workflow_id")
                    .table(WorkflowSteps::Table)
                    .col(WorkflowSteps::WorkflowId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(WorkflowSteps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Workflows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PeerWorkflowItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssessmentParts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assessments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rubrics::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Rubrics {
    Table,
    Id,
    ContentHash,
    Body,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Assessments {
    Table,
    Id,
    SubmissionUuid,
    RubricId,
    ScorerId,
    ScorerSubmissionUuid,
    ScoreType,
    Feedback,
    PointsPossible,
    ScoredAt,
}

#[derive(DeriveIden)]
enum AssessmentParts {
    Table,
    Id,
    AssessmentId,
    CriterionName,
    OptionName,
    Points,
    Feedback,
}

#[derive(DeriveIden)]
enum PeerWorkflowItems {
    Table,
    Id,
    ScorerSubmissionUuid,
    SubmissionUuid,
    StartedAt,
    AssessmentId,
}

#[derive(DeriveIden)]
enum Workflows {
    Table,
    Id,
    Uuid,
    SubmissionUuid,
    CourseId,
    ItemId,
    Status,
    CreatedAt,
    ModifiedAt,
}

#[derive(DeriveIden)]
enum WorkflowSteps {
    Table,
    Id,
    WorkflowId,
    Name,
    OrderNum,
    MustGrade,
    MustBeGradedBy,
    StartAt,
    DueAt,
    SubmitterCompletedAt,
    AssessmentCompletedAt,
}
