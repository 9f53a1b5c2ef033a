//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assessments;
mod peer_items;
mod rubrics;
mod submissions;
mod workflows;

use crate::config::AppConfig;
use crate::errors::{AssessmentError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config.database.pool_size, config.database.timeout)
                .await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        Self::migrate(&db).await?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// 运行迁移
    async fn migrate(db: &DatabaseConnection) -> Result<()> {
        Migrator::up(db, None)
            .await
            .map_err(|e| AssessmentError::database_operation(format!("数据库迁移失败: {e}")))
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(
        url: &str,
        pool_size: u32,
        timeout: u64,
    ) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| AssessmentError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| AssessmentError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| AssessmentError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(AssessmentError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 内存数据库，仅用于测试
    ///
    /// 内存库只存在于单个连接中，连接池必须固定为一个连接；
    /// 事务内部只能使用事务句柄，否则会等待自身持有的连接。
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Result<Self> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AssessmentError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| AssessmentError::database_connection(format!("SQLite 连接失败: {e}")))?;

        let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
        Self::migrate(&db).await?;
        Ok(Self { db })
    }
}

/// 唯一约束冲突
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// Storage trait 实现
use crate::models::{
    SubmissionCursor, SubmissionPage,
    assessments::entities::{Assessment, NewAssessment, PeerCandidate, PeerCheckout},
    rubrics::entities::Rubric,
    steps::entities::{AssessmentStepConfig, StepName},
    submissions::entities::{Score, StudentItem, Submission},
    workflows::entities::{Workflow, WorkflowStatus},
};
use crate::storage::{Storage, SubmissionStore};
use async_trait::async_trait;

#[async_trait]
impl SubmissionStore for SeaOrmStorage {
    async fn create_submission(
        &self,
        student_item: StudentItem,
        answer: serde_json::Value,
    ) -> Result<Submission> {
        self.create_submission_impl(student_item, answer).await
    }

    async fn get_submission_and_student(&self, uuid: &str) -> Result<Option<Submission>> {
        self.get_submission_impl(uuid).await
    }

    async fn get_latest_score_for_submission(&self, uuid: &str) -> Result<Option<Score>> {
        self.get_latest_score_impl(uuid).await
    }

    async fn set_score(
        &self,
        uuid: &str,
        points_earned: i32,
        points_possible: i32,
    ) -> Result<Score> {
        self.set_score_impl(uuid, points_earned, points_possible)
            .await
    }

    async fn list_submissions(
        &self,
        course_id: &str,
        item_id: &str,
        cursor: Option<&SubmissionCursor>,
        limit: u64,
    ) -> Result<SubmissionPage> {
        self.list_submissions_impl(course_id, item_id, cursor, limit)
            .await
    }
}

#[async_trait]
impl Storage for SeaOrmStorage {
    // 互评分配模块
    async fn list_peer_candidates(&self, requester: &Submission) -> Result<Vec<PeerCandidate>> {
        self.list_peer_candidates_impl(requester).await
    }

    async fn get_open_checkout(
        &self,
        scorer_submission_uuid: &str,
    ) -> Result<Option<PeerCheckout>> {
        self.get_open_checkout_impl(scorer_submission_uuid).await
    }

    async fn start_peer_checkout(
        &self,
        scorer_submission_uuid: &str,
        submission_uuid: &str,
    ) -> Result<PeerCheckout> {
        self.start_peer_checkout_impl(scorer_submission_uuid, submission_uuid)
            .await
    }

    // 评估模块
    async fn count_assessments_by_scorer(
        &self,
        scorer_submission_uuid: &str,
        score_type: StepName,
    ) -> Result<u32> {
        self.count_assessments_by_scorer_impl(scorer_submission_uuid, score_type)
            .await
    }

    async fn count_assessments_for_submission(
        &self,
        submission_uuid: &str,
        score_type: StepName,
    ) -> Result<u32> {
        self.count_assessments_for_submission_impl(submission_uuid, score_type)
            .await
    }

    async fn list_assessments_for_submission(
        &self,
        submission_uuid: &str,
        score_type: StepName,
    ) -> Result<Vec<Assessment>> {
        self.list_assessments_for_submission_impl(submission_uuid, score_type)
            .await
    }

    async fn create_assessment(
        &self,
        assessment: NewAssessment,
        required: Option<u32>,
    ) -> Result<(Assessment, Option<Score>)> {
        self.create_assessment_impl(assessment, required).await
    }

    async fn get_item_rubric(&self, course_id: &str, item_id: &str) -> Result<Option<Rubric>> {
        self.get_item_rubric_impl(course_id, item_id).await
    }

    // 工作流模块
    async fn create_workflow(
        &self,
        submission: &Submission,
        steps: &AssessmentStepConfig,
    ) -> Result<Workflow> {
        self.create_workflow_impl(submission, steps).await
    }

    async fn get_workflow(&self, submission_uuid: &str) -> Result<Option<Workflow>> {
        self.get_workflow_impl(submission_uuid).await
    }

    async fn save_workflow_progress(&self, workflow: &Workflow) -> Result<Workflow> {
        self.save_workflow_progress_impl(workflow).await
    }

    async fn count_workflows_by_status(
        &self,
        course_id: &str,
        item_id: &str,
    ) -> Result<Vec<(WorkflowStatus, u64)>> {
        self.count_workflows_by_status_impl(course_id, item_id)
            .await
    }
}
