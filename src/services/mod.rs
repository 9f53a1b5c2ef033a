//! 评估业务逻辑层
//!
//! `AssessmentService` 汇集互评分配、评分聚合和工作流状态机，
//! 只通过 `Storage` 与 `SubmissionStore` 访问持久化数据。

pub mod allocation;
pub mod peer;
pub mod self_assessment;
pub mod submissions;
pub mod workflow;

use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::GradingConfig;
use crate::errors::{AssessmentError, Result};
use crate::models::rubrics::entities::Rubric;
use crate::models::submissions::entities::Submission;
use crate::storage::{Storage, SubmissionStore};
use crate::validation::validate_rubric;

/// 互评分配策略
#[derive(Debug, Clone, Copy)]
pub struct GradingPolicy {
    pub tie_window: usize,
    pub checkout_timeout: chrono::Duration,
    pub over_grading_allowed: bool,
}

impl From<&GradingConfig> for GradingPolicy {
    fn from(config: &GradingConfig) -> Self {
        Self {
            tie_window: config.tie_window.max(1),
            checkout_timeout: chrono::Duration::seconds(config.checkout_timeout_secs.max(0)),
            over_grading_allowed: config.over_grading_allowed,
        }
    }
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self::from(&GradingConfig::default())
    }
}

pub struct AssessmentService {
    storage: Arc<dyn Storage>,
    submissions: Arc<dyn SubmissionStore>,
    policy: GradingPolicy,
    rng: Mutex<StdRng>,
}

impl AssessmentService {
    pub fn new(
        storage: Arc<dyn Storage>,
        submissions: Arc<dyn SubmissionStore>,
        policy: GradingPolicy,
    ) -> Self {
        Self {
            storage,
            submissions,
            policy,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// 使用固定种子，分配结果可复现
    pub fn with_seed(
        storage: Arc<dyn Storage>,
        submissions: Arc<dyn SubmissionStore>,
        policy: GradingPolicy,
        seed: u64,
    ) -> Self {
        Self {
            storage,
            submissions,
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn policy(&self) -> &GradingPolicy {
        &self.policy
    }

    pub(crate) fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub(crate) fn submission_store(&self) -> &Arc<dyn SubmissionStore> {
        &self.submissions
    }

    /// 获取提交，不存在时返回请求错误
    pub(crate) async fn require_submission(&self, uuid: &str) -> Result<Submission> {
        self.submissions
            .get_submission_and_student(uuid)
            .await?
            .ok_or_else(|| AssessmentError::request(format!("Submission {uuid} does not exist")))
    }

    /// 同一题目已有评估时，新的评分标准必须与其兼容
    pub(crate) async fn ensure_rubric_unchanged(
        &self,
        submission: &Submission,
        rubric: &Rubric,
    ) -> Result<()> {
        let item = &submission.student_item;
        let Some(current) = self
            .storage
            .get_item_rubric(&item.course_id, &item.item_id)
            .await?
        else {
            return Ok(());
        };
        let outcome = validate_rubric(rubric, Some(&current), true);
        if outcome.success {
            Ok(())
        } else {
            Err(AssessmentError::request(outcome.message))
        }
    }

    /// 在锁内使用随机数生成器
    pub(crate) fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! 服务层测试共用的内存环境

    use super::*;
    use crate::models::steps::entities::StepSpec;
    use crate::models::submissions::entities::StudentItem;
    use crate::models::submissions::requests::CreateSubmissionRequest;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    pub async fn service_with(policy: GradingPolicy) -> AssessmentService {
        let storage = Arc::new(SeaOrmStorage::in_memory().await.unwrap());
        AssessmentService::with_seed(storage.clone(), storage, policy, 42)
    }

    /// 严格按最早优先分配
    pub async fn service() -> AssessmentService {
        service_with(GradingPolicy {
            tie_window: 1,
            ..GradingPolicy::default()
        })
        .await
    }

    /// 互评后自评，唯一包含互评的合法步骤配置
    pub fn peer_then_self(must_grade: u32, must_be_graded_by: u32) -> Vec<StepSpec> {
        vec![
            StepSpec::peer(must_grade, must_be_graded_by),
            StepSpec::self_assessment(),
        ]
    }

    pub async fn submit(
        service: &AssessmentService,
        student_id: &str,
        steps: Vec<StepSpec>,
    ) -> Submission {
        let (submission, _) = service
            .create_submission(CreateSubmissionRequest {
                student_item: StudentItem {
                    student_id: student_id.to_string(),
                    item_id: "item-1".to_string(),
                    course_id: "course-1".to_string(),
                },
                answer: serde_json::json!({ "text": format!("answer from {student_id}") }),
                steps,
            })
            .await
            .unwrap();
        submission
    }
}
