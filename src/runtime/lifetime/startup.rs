use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::services::{AssessmentService, GradingPolicy};

pub struct StartupContext {
    pub service: Arc<AssessmentService>,
}

/// 准备服务器启动的上下文
/// 包括存储初始化、数据库迁移和评估服务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let config = AppConfig::get();

    let (storage, submissions) = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    let policy = GradingPolicy::from(&config.grading);
    info!(
        tie_window = policy.tie_window,
        checkout_timeout_secs = policy.checkout_timeout.num_seconds(),
        over_grading_allowed = policy.over_grading_allowed,
        "Grading policy loaded"
    );

    let service = Arc::new(AssessmentService::new(storage, submissions, policy));
    Ok(StartupContext { service })
}
