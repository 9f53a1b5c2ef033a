use actix_web::{HttpResponse, Result as ActixResult, web};

use crate::models::validation::requests::{
    ValidateAssessmentsRequest, ValidateDatesRequest, ValidateRubricRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::validation::{
    ValidationOutcome, validate_assessments, validate_dates, validate_rubric,
};

// 校验失败不是请求错误，结果始终作为数据返回
fn outcome_response(outcome: ValidationOutcome) -> HttpResponse {
    if outcome.success {
        HttpResponse::Ok().json(ApiResponse::success(outcome, "校验通过"))
    } else {
        let message = outcome.message.clone();
        HttpResponse::Ok().json(ApiResponse::error(
            ErrorCode::ValidationFailed,
            outcome,
            message,
        ))
    }
}

// 校验评分标准
pub async fn validate_rubric_config(
    body: web::Json<ValidateRubricRequest>,
) -> ActixResult<HttpResponse> {
    let req = body.into_inner();
    let outcome = validate_rubric(&req.rubric, req.current_rubric.as_ref(), req.is_released);
    Ok(outcome_response(outcome))
}

// 校验评估步骤配置
pub async fn validate_assessments_config(
    body: web::Json<ValidateAssessmentsRequest>,
) -> ActixResult<HttpResponse> {
    let outcome = validate_assessments(&body.assessments);
    Ok(outcome_response(outcome))
}

// 校验日期配置
pub async fn validate_dates_config(
    body: web::Json<ValidateDatesRequest>,
) -> ActixResult<HttpResponse> {
    let ranges: Vec<(Option<&str>, Option<&str>)> = body
        .date_ranges
        .iter()
        .map(|(start, due)| (start.as_deref(), due.as_deref()))
        .collect();
    let outcome = validate_dates(body.start.as_deref(), body.due.as_deref(), &ranges);
    Ok(outcome_response(outcome))
}

// 配置路由
pub fn configure_validation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/validation")
            .route("/rubric", web::post().to(validate_rubric_config))
            .route("/assessments", web::post().to(validate_assessments_config))
            .route("/dates", web::post().to(validate_dates_config)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn test_validate_assessments_route() {
        let app = test::init_service(App::new().configure(configure_validation_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/validation/assessments")
            .set_json(json!({ "assessments": [{ "name": "self" }, { "name": "peer", "must_grade": 1, "must_be_graded_by": 1 }] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["code"], ErrorCode::ValidationFailed as i32);
        assert_eq!(body["data"]["success"], false);
        assert!(!body["data"]["message"].as_str().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_validate_dates_route() {
        let app = test::init_service(App::new().configure(configure_validation_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/validation/dates")
            .set_json(json!({
                "start": "2014-01-01",
                "due": "2014-01-14",
                "date_ranges": [["2014-01-02", "2014-01-05"]]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["code"], 0);
        assert_eq!(body["data"]["success"], true);
        assert_eq!(body["data"]["message"], "");
    }
}
