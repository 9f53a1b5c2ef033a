use actix_web::{HttpResponse, Result as ActixResult, web};

use super::respond;
use crate::models::submissions::requests::{CreateSubmissionRequest, SubmissionListQuery};
use crate::models::submissions::responses::CreateSubmissionResponse;
use crate::services::AssessmentService;

// 列出提交
pub async fn list_submissions(
    service: web::Data<AssessmentService>,
    query: web::Query<SubmissionListQuery>,
) -> ActixResult<HttpResponse> {
    let result = service.list_submissions(query.into_inner()).await;
    Ok(respond(result, "获取提交列表成功"))
}

// 创建提交
pub async fn create_submission(
    service: web::Data<AssessmentService>,
    body: web::Json<CreateSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let result = service
        .create_submission(body.into_inner())
        .await
        .map(|(submission, workflow)| CreateSubmissionResponse {
            submission,
            workflow,
        });
    Ok(respond(result, "提交成功"))
}

// 配置路由
pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .route("", web::get().to(list_submissions))
            .route("", web::post().to(create_submission)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::service;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn test_create_then_list() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service().await))
                .configure(configure_submissions_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/submissions")
            .set_json(json!({
                "student_item": { "student_id": "alice", "item_id": "item-1", "course_id": "course-1" },
                "answer": { "text": "essay" },
                "steps": [{ "name": "self" }]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["workflow"]["status"], "self");

        let req = test::TestRequest::get()
            .uri("/api/v1/submissions?course_id=course-1&item_id=item-1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_invalid_steps_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service().await))
                .configure(configure_submissions_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/submissions")
            .set_json(json!({
                "student_item": { "student_id": "alice", "item_id": "item-1", "course_id": "course-1" },
                "answer": "essay",
                "steps": []
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
