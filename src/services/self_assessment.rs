//! 自评

use std::collections::BTreeMap;

use chrono::Utc;

use super::AssessmentService;
use crate::errors::{AssessmentError, Result};
use crate::models::assessments::entities::{Assessment, NewAssessment};
use crate::models::assessments::requests::SelfAssessRequest;
use crate::models::rubrics::entities::Rubric;
use crate::models::steps::entities::StepName;
use crate::scoring::parts_from_selection;
use crate::validation::validate_rubric;

impl AssessmentService {
    /// 创建自评，只有提交者本人可以自评且只能自评一次
    pub async fn create_self_assessment(
        &self,
        submission_uuid: &str,
        user_id: &str,
        options_selected: &BTreeMap<String, String>,
        rubric: &Rubric,
    ) -> Result<Assessment> {
        let outcome = validate_rubric(rubric, None, false);
        if !outcome.success {
            return Err(AssessmentError::request(outcome.message));
        }

        let submission = self.require_submission(submission_uuid).await?;
        if submission.student_item.student_id != user_id {
            return Err(AssessmentError::request(
                "Only the student who made the submission can self-assess it",
            ));
        }
        self.ensure_step_open(submission_uuid, StepName::SelfAssessment)
            .await?;
        self.ensure_rubric_unchanged(&submission, rubric).await?;

        let existing = self
            .storage()
            .count_assessments_for_submission(submission_uuid, StepName::SelfAssessment)
            .await?;
        if existing > 0 {
            return Err(AssessmentError::request(format!(
                "Submission {submission_uuid} has already been self-assessed"
            )));
        }

        let parts = parts_from_selection(rubric, options_selected, &BTreeMap::new())?;

        let (assessment, _) = self
            .storage()
            .create_assessment(
                NewAssessment {
                    submission_uuid: submission_uuid.to_string(),
                    scorer_id: user_id.to_string(),
                    scorer_submission_uuid: submission_uuid.to_string(),
                    score_type: StepName::SelfAssessment,
                    rubric: rubric.clone(),
                    feedback: String::new(),
                    parts,
                    scored_at: Utc::now(),
                },
                None,
            )
            .await?;

        Ok(assessment)
    }

    /// 提交自评并推进工作流
    pub async fn self_assess(&self, req: SelfAssessRequest) -> Result<Assessment> {
        let assessment = self
            .create_self_assessment(
                &req.submission_uuid,
                &req.user_id,
                &req.options_selected,
                &req.rubric,
            )
            .await
            .inspect_err(|e| e.report("Self assessment failed"))?;

        self.update_workflow_status(&req.submission_uuid)
            .await
            .map_err(AssessmentError::into_workflow)
            .inspect_err(|e| e.report("Workflow update after self assessment failed"))?;

        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::errors::ErrorTier;
    use crate::models::rubrics::entities::fixtures::ideas_rubric;
    use crate::models::steps::entities::StepSpec;

    fn good() -> BTreeMap<String, String> {
        [("Ideas".to_string(), "Good".to_string())].into()
    }

    #[tokio::test]
    async fn test_only_owner_can_self_assess() {
        let service = service().await;
        let alice = submit(&service, "alice", vec![StepSpec::self_assessment()]).await;

        let err = service
            .create_self_assessment(&alice.uuid, "mallory", &good(), &ideas_rubric())
            .await
            .unwrap_err();
        assert_eq!(err.tier(), ErrorTier::Request);

        let assessment = service
            .create_self_assessment(&alice.uuid, "alice", &good(), &ideas_rubric())
            .await
            .unwrap();
        assert_eq!(assessment.score_type, StepName::SelfAssessment);
        assert_eq!(assessment.points_earned, 3);
    }

    #[tokio::test]
    async fn test_self_assessment_only_once() {
        let service = service().await;
        let alice = submit(&service, "alice", vec![StepSpec::self_assessment()]).await;

        service
            .create_self_assessment(&alice.uuid, "alice", &good(), &ideas_rubric())
            .await
            .unwrap();
        let err = service
            .create_self_assessment(&alice.uuid, "alice", &good(), &ideas_rubric())
            .await
            .unwrap_err();
        assert_eq!(err.tier(), ErrorTier::Request);
    }

    #[tokio::test]
    async fn test_unknown_submission_is_request_error() {
        let service = service().await;
        let err = service
            .create_self_assessment("missing", "alice", &good(), &ideas_rubric())
            .await
            .unwrap_err();
        assert_eq!(err.tier(), ErrorTier::Request);
    }

    #[tokio::test]
    async fn test_closed_self_step_rejects_assessment() {
        let service = service().await;
        let closed = StepSpec {
            due: Some("2000-01-01".to_string()),
            ..StepSpec::self_assessment()
        };
        let alice = submit(&service, "alice", vec![closed]).await;

        let err = service
            .create_self_assessment(&alice.uuid, "alice", &good(), &ideas_rubric())
            .await
            .unwrap_err();
        assert_eq!(err.tier(), ErrorTier::Request);
        assert_eq!(
            service
                .storage()
                .count_assessments_for_submission(&alice.uuid, StepName::SelfAssessment)
                .await
                .unwrap(),
            0
        );
    }
}
