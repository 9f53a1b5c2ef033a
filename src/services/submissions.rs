use tracing::info;

use super::AssessmentService;
use crate::errors::Result;
use crate::models::steps::entities::AssessmentStepConfig;
use crate::models::submissions::entities::Submission;
use crate::models::submissions::requests::{CreateSubmissionRequest, SubmissionListQuery};
use crate::models::workflows::responses::WorkflowStatusInfo;
use crate::models::{SubmissionCursor, SubmissionPage};

const DEFAULT_PAGE_SIZE: u64 = 20;

impl AssessmentService {
    /// 创建提交并为其创建工作流
    ///
    /// 步骤配置先于提交校验，配置不合法时不会留下提交。
    pub async fn create_submission(
        &self,
        req: CreateSubmissionRequest,
    ) -> Result<(Submission, WorkflowStatusInfo)> {
        let steps = AssessmentStepConfig::new(&req.steps)?;

        let submission = self
            .submission_store()
            .create_submission(req.student_item, req.answer)
            .await?;
        info!(
            submission_uuid = %submission.uuid,
            student_id = %submission.student_item.student_id,
            "Submission created"
        );

        let status = self.start_workflow(&submission, &steps).await?;
        Ok((submission, status))
    }

    /// 按游标分页列出同一题目的提交
    pub async fn list_submissions(&self, query: SubmissionListQuery) -> Result<SubmissionPage> {
        let cursor = query
            .cursor
            .as_deref()
            .map(SubmissionCursor::decode)
            .transpose()?;

        self.submission_store()
            .list_submissions(
                &query.course_id,
                &query.item_id,
                cursor.as_ref(),
                query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::errors::ErrorTier;
    use crate::models::steps::entities::StepSpec;
    use crate::models::submissions::entities::StudentItem;
    use crate::models::submissions::requests::{CreateSubmissionRequest, SubmissionListQuery};
    use crate::models::workflows::entities::WorkflowStatus;

    #[tokio::test]
    async fn test_create_submission_enters_first_step() {
        let service = service().await;
        let (submission, status) = service
            .create_submission(CreateSubmissionRequest {
                student_item: StudentItem {
                    student_id: "alice".to_string(),
                    item_id: "item-1".to_string(),
                    course_id: "course-1".to_string(),
                },
                answer: serde_json::json!("essay"),
                steps: vec![StepSpec::peer(1, 1), StepSpec::self_assessment()],
            })
            .await
            .unwrap();

        assert_eq!(status.submission_uuid, submission.uuid);
        assert_eq!(status.status, WorkflowStatus::Peer);
        assert!(status.score.is_none());
    }

    #[tokio::test]
    async fn test_invalid_steps_create_nothing() {
        let service = service().await;
        let err = service
            .create_submission(CreateSubmissionRequest {
                student_item: StudentItem {
                    student_id: "alice".to_string(),
                    item_id: "item-1".to_string(),
                    course_id: "course-1".to_string(),
                },
                answer: serde_json::json!("essay"),
                steps: vec![StepSpec::self_assessment(), StepSpec::peer(1, 1)],
            })
            .await
            .unwrap_err();
        assert_eq!(err.tier(), ErrorTier::Request);

        let page = service
            .list_submissions(SubmissionListQuery {
                course_id: "course-1".to_string(),
                item_id: "item-1".to_string(),
                cursor: None,
                limit: None,
            })
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_submissions_pages_through_everything() {
        let service = service().await;
        for student in ["a", "b", "c", "d", "e"] {
            submit(&service, student, vec![StepSpec::self_assessment()]).await;
        }

        let mut total = 0;
        let mut cursor = None;
        loop {
            let page = service
                .list_submissions(SubmissionListQuery {
                    course_id: "course-1".to_string(),
                    item_id: "item-1".to_string(),
                    cursor: cursor.take(),
                    limit: Some(2),
                })
                .await
                .unwrap();
            total += page.items.len();
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_malformed_cursor_is_request_error() {
        let service = service().await;
        let err = service
            .list_submissions(SubmissionListQuery {
                course_id: "course-1".to_string(),
                item_id: "item-1".to_string(),
                cursor: Some("not-a-cursor".to_string()),
                limit: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.tier(), ErrorTier::Request);
    }
}
