use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建提交表（提交本身不可变）
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Uuid)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submissions::StudentId).string().not_null())
                    .col(ColumnDef::new(Submissions::CourseId).string().not_null())
                    .col(ColumnDef::new(Submissions::ItemId).string().not_null())
                    .col(ColumnDef::new(Submissions::Answer).text().not_null())
                    .col(
                        ColumnDef::new(Submissions::SubmittedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建分数表
        manager
            .create_table(
                Table::create()
                    .table(Scores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Scores::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Scores::SubmissionUuid)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Scores::PointsEarned).integer().not_null())
                    .col(ColumnDef::new(Scores::PointsPossible).integer().not_null())
                    .col(ColumnDef::new(Scores::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Scores::Table, Scores::SubmissionUuid)
                            .to(Submissions::Table, Submissions::Uuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 提交表索引（按课程/题目分页，排序键为 created_at + uuid）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_course_item_created")
                    .table(Submissions::Table)
                    .col(Submissions::CourseId)
                    .col(Submissions::ItemId)
                    .col(Submissions::CreatedAt)
                    .col(Submissions::Uuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scores_submission_uuid")
                    .table(Scores::Table)
                    .col(Scores::SubmissionUuid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Scores::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Submissions {
    Table,
    Uuid,
    StudentId,
    CourseId,
    ItemId,
    Answer,
    SubmittedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Scores {
    Table,
    Id,
    SubmissionUuid,
    PointsEarned,
    PointsPossible,
    CreatedAt,
}
