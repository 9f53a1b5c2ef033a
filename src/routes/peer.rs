use actix_web::{HttpResponse, Result as ActixResult, web};

use super::respond;
use crate::models::assessments::requests::{
    NextPeerRequest, PeerAssessRequest, PeerProgressQuery, SelfAssessRequest,
};
use crate::models::assessments::responses::PeerProgressResponse;
use crate::services::AssessmentService;

// 领取下一份待评提交，没有可分配的提交时 data 为 null
pub async fn next_submission(
    service: web::Data<AssessmentService>,
    body: web::Json<NextPeerRequest>,
) -> ActixResult<HttpResponse> {
    let req = body.into_inner();
    let result = service
        .get_submission_to_assess(
            &req.requesting_submission_uuid,
            req.required_num_assessments,
            req.over_grading_allowed,
        )
        .await
        .inspect_err(|e| e.report("Peer allocation failed"));
    Ok(respond(result, "获取待评提交成功"))
}

// 查询评估者的互评进度
pub async fn peer_progress(
    service: web::Data<AssessmentService>,
    query: web::Query<PeerProgressQuery>,
) -> ActixResult<HttpResponse> {
    let result = service
        .has_finished_required_evaluating(&query.submission_uuid, query.required)
        .await
        .map(|(finished, completed)| PeerProgressResponse {
            finished,
            completed,
        });
    Ok(respond(result, "获取互评进度成功"))
}

// 提交互评
pub async fn peer_assess(
    service: web::Data<AssessmentService>,
    body: web::Json<PeerAssessRequest>,
) -> ActixResult<HttpResponse> {
    let result = service.peer_assess(body.into_inner()).await;
    Ok(respond(result, "互评提交成功"))
}

// 提交自评
pub async fn self_assess(
    service: web::Data<AssessmentService>,
    body: web::Json<SelfAssessRequest>,
) -> ActixResult<HttpResponse> {
    let result = service.self_assess(body.into_inner()).await;
    Ok(respond(result, "自评提交成功"))
}

// 配置路由
pub fn configure_peer_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/peer")
            .route("/next", web::post().to(next_submission))
            .route("/progress", web::get().to(peer_progress))
            .route("/assess", web::post().to(peer_assess)),
    )
    .service(web::scope("/api/v1/self").route("/assess", web::post().to(self_assess)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rubrics::entities::fixtures::ideas_rubric;
    use crate::models::steps::entities::StepSpec;
    use crate::services::test_support::{peer_then_self, service, submit};
    use actix_web::{App, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn test_peer_flow_over_http() {
        let service = service().await;
        let steps = peer_then_self(1, 1);
        let alice = submit(&service, "alice", steps.clone()).await;
        let bob = submit(&service, "bob", steps).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .configure(configure_peer_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/peer/next")
            .set_json(json!({
                "requesting_submission_uuid": alice.uuid,
                "required_num_assessments": 1
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["uuid"], bob.uuid.as_str());

        let req = test::TestRequest::post()
            .uri("/api/v1/peer/assess")
            .set_json(json!({
                "submission_uuid": bob.uuid,
                "scorer_submission_uuid": alice.uuid,
                "scorer_id": "alice",
                "options_selected": { "Ideas": "Excellent" },
                "rubric": ideas_rubric()
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["points_earned"], 5);

        let req = test::TestRequest::get()
            .uri(&format!(
                "/api/v1/peer/progress?submission_uuid={}&required=1",
                alice.uuid
            ))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["finished"], true);
        assert_eq!(body["data"]["completed"], 1);
    }

    #[actix_web::test]
    async fn test_self_assess_of_others_is_bad_request() {
        let service = service().await;
        let alice = submit(&service, "alice", vec![StepSpec::self_assessment()]).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .configure(configure_peer_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/self/assess")
            .set_json(json!({
                "submission_uuid": alice.uuid,
                "user_id": "mallory",
                "options_selected": { "Ideas": "Good" },
                "rubric": ideas_rubric()
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
