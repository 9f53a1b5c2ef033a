use actix_web::{HttpResponse, Result as ActixResult, web};

use super::respond;
use crate::errors::Result;
use crate::models::steps::entities::StepName;
use crate::models::workflows::requests::{CreateWorkflowRequest, StatusCountQuery};
use crate::services::AssessmentService;

fn parse_steps(steps: Option<&str>) -> Result<Vec<StepName>> {
    steps
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

// 查询工作流状态
pub async fn get_workflow(
    service: web::Data<AssessmentService>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let result = service.get_workflow_status(&path.into_inner()).await;
    Ok(respond(result, "获取工作流成功"))
}

// 为已有提交创建工作流
pub async fn create_workflow(
    service: web::Data<AssessmentService>,
    path: web::Path<String>,
    body: web::Json<CreateWorkflowRequest>,
) -> ActixResult<HttpResponse> {
    let result = service
        .create_workflow(&path.into_inner(), &body.steps)
        .await
        .inspect_err(|e| e.report("Workflow creation failed"));
    Ok(respond(result, "创建工作流成功"))
}

// 根据评估情况推进工作流
pub async fn update_workflow(
    service: web::Data<AssessmentService>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let result = service
        .update_workflow_status(&path.into_inner())
        .await
        .inspect_err(|e| e.report("Workflow update failed"));
    Ok(respond(result, "工作流已更新"))
}

// 各状态工作流数量
pub async fn status_counts(
    service: web::Data<AssessmentService>,
    query: web::Query<StatusCountQuery>,
) -> ActixResult<HttpResponse> {
    let result = match parse_steps(query.steps.as_deref()) {
        Ok(steps) => {
            service
                .get_status_counts(&query.course_id, &query.item_id, &steps)
                .await
        }
        Err(e) => Err(e),
    };
    Ok(respond(result, "获取状态统计成功"))
}

// 配置路由
pub fn configure_workflows_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/workflows")
            .route("/counts", web::get().to(status_counts))
            .route("/{submission_uuid}", web::get().to(get_workflow))
            .route("/{submission_uuid}", web::post().to(update_workflow))
            .route("/{submission_uuid}/create", web::post().to(create_workflow)),
    );
}
