use serde::Deserialize;

use crate::models::rubrics::entities::Rubric;
use crate::models::steps::entities::StepSpec;

// 评分标准校验请求
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRubricRequest {
    pub rubric: Rubric,
    pub current_rubric: Option<Rubric>,
    #[serde(default)]
    pub is_released: bool,
}

// 步骤配置校验请求
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateAssessmentsRequest {
    pub assessments: Vec<StepSpec>,
}

// 日期配置校验请求
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateDatesRequest {
    pub start: Option<String>,
    pub due: Option<String>,
    #[serde(default)]
    pub date_ranges: Vec<(Option<String>, Option<String>)>,
}
