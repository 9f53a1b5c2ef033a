//! 评分聚合
//!
//! 根据评分标准校验所选选项并生成评估明细，
//! 在评估数量足够时由评估明细计算提交得分。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::errors::{AssessmentError, Result};
use crate::models::assessments::entities::{Assessment, AssessmentPart};
use crate::models::rubrics::entities::{FeedbackPolicy, Rubric};

/// 计算得到的分数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreValue {
    pub points_earned: i32,
    pub points_possible: i32,
}

/// 由所选选项生成评估明细
///
/// 所选选项必须恰好覆盖评分标准中的全部评分项，且选项名称存在。
/// 只有反馈策略为 `optional` 的评分项保留文字反馈，其余静默丢弃。
pub fn parts_from_selection(
    rubric: &Rubric,
    options_selected: &BTreeMap<String, String>,
    criterion_feedback: &BTreeMap<String, String>,
) -> Result<Vec<AssessmentPart>> {
    if let Some(unknown) = options_selected
        .keys()
        .find(|name| rubric.criterion(name).is_none())
    {
        return Err(AssessmentError::request(format!(
            "Criterion '{unknown}' is not part of the rubric"
        )));
    }

    rubric
        .criteria
        .iter()
        .map(|criterion| {
            let option_name = options_selected.get(&criterion.name).ok_or_else(|| {
                AssessmentError::request(format!(
                    "An option must be selected for criterion '{}'",
                    criterion.name
                ))
            })?;
            let option = criterion.option(option_name).ok_or_else(|| {
                AssessmentError::request(format!(
                    "Option '{option_name}' does not exist for criterion '{}'",
                    criterion.name
                ))
            })?;
            let feedback = match criterion.feedback {
                FeedbackPolicy::Optional => criterion_feedback
                    .get(&criterion.name)
                    .cloned()
                    .unwrap_or_default(),
                FeedbackPolicy::Disabled | FeedbackPolicy::Required => String::new(),
            };
            Ok(AssessmentPart {
                criterion_name: criterion.name.clone(),
                option_name: option.name.clone(),
                points: option.points,
                feedback,
            })
        })
        .collect()
}

/// 由最近的 `required` 份评估计算分数
///
/// `assessments` 需按时间从新到旧排列。每个评分项取中位数（偶数个时向上取整），
/// 再对所有评分项求和；只有一份评估时即为其选项分值之和。评估不足时返回 `None`。
pub fn score_from_assessments(assessments: &[Assessment], required: usize) -> Option<ScoreValue> {
    let required = required.max(1);
    if assessments.len() < required {
        return None;
    }
    let batch = &assessments[..required];

    let mut by_criterion: HashMap<&str, Vec<i32>> = HashMap::new();
    for part in batch.iter().flat_map(|assessment| assessment.parts.iter()) {
        by_criterion
            .entry(part.criterion_name.as_str())
            .or_default()
            .push(part.points);
    }

    let points_earned = by_criterion
        .into_values()
        .map(|mut points| median_ceil(&mut points))
        .sum();

    Some(ScoreValue {
        points_earned,
        points_possible: batch[0].points_possible,
    })
}

fn median_ceil(points: &mut [i32]) -> i32 {
    points.sort_unstable();
    let len = points.len();
    if len == 0 {
        return 0;
    }
    if len % 2 == 1 {
        points[len / 2]
    } else {
        let sum = f64::from(points[len / 2 - 1]) + f64::from(points[len / 2]);
        (sum / 2.0).ceil() as i32
    }
}
