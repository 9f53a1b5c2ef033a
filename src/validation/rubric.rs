use std::collections::HashSet;

use super::ValidationOutcome;
use crate::models::rubrics::entities::Rubric;

/// 校验评分标准
///
/// 未发布时只检查结构；已发布时还要求与当前评分标准兼容，
/// 不能删除或改名已有评分项和选项，不能新增评分项，已有选项分值不可改变。
pub fn validate_rubric(
    proposed: &Rubric,
    current: Option<&Rubric>,
    is_released: bool,
) -> ValidationOutcome {
    let result = check_structure(proposed).and_then(|()| match current {
        Some(current) if is_released => check_compatible(proposed, current),
        _ => Ok(()),
    });
    result.into()
}

fn check_structure(rubric: &Rubric) -> Result<(), String> {
    if rubric.criteria.is_empty() {
        return Err("The rubric must contain at least one criterion.".to_string());
    }

    let mut criterion_names = HashSet::new();
    for criterion in &rubric.criteria {
        if criterion.name.trim().is_empty() {
            return Err("Criterion names cannot be empty.".to_string());
        }
        if !criterion_names.insert(criterion.name.as_str()) {
            return Err(format!(
                "Criteria names must be unique; '{}' is duplicated.",
                criterion.name
            ));
        }
        if criterion.options.is_empty() {
            return Err(format!(
                "Criterion '{}' must have at least one option.",
                criterion.name
            ));
        }

        let mut option_names = HashSet::new();
        for option in &criterion.options {
            if option.name.trim().is_empty() {
                return Err(format!(
                    "Option names in criterion '{}' cannot be empty.",
                    criterion.name
                ));
            }
            if !option_names.insert(option.name.as_str()) {
                return Err(format!(
                    "Option names must be unique within criterion '{}'; '{}' is duplicated.",
                    criterion.name, option.name
                ));
            }
            if option.points < 0 {
                return Err(format!(
                    "Option '{}' in criterion '{}' cannot have negative points.",
                    option.name, criterion.name
                ));
            }
        }
    }

    if rubric.points_possible() <= 0 {
        return Err("The rubric must be worth a positive number of points.".to_string());
    }

    Ok(())
}

fn check_compatible(proposed: &Rubric, current: &Rubric) -> Result<(), String> {
    if proposed.content_hash() == current.content_hash() {
        return Ok(());
    }

    for existing in &current.criteria {
        let Some(criterion) = proposed.criterion(&existing.name) else {
            return Err(format!(
                "Criterion '{}' cannot be removed or renamed after the problem is released.",
                existing.name
            ));
        };
        for option in &existing.options {
            match criterion.option(&option.name) {
                None => {
                    return Err(format!(
                        "Option '{}' in criterion '{}' cannot be removed or renamed after the problem is released.",
                        option.name, existing.name
                    ));
                }
                Some(updated) if updated.points != option.points => {
                    return Err(format!(
                        "Points for option '{}' in criterion '{}' cannot change after the problem is released.",
                        option.name, existing.name
                    ));
                }
                Some(_) => {}
            }
        }
    }

    if let Some(added) = proposed
        .criteria
        .iter()
        .find(|criterion| current.criterion(&criterion.name).is_none())
    {
        return Err(format!(
            "Criterion '{}' cannot be added after the problem is released.",
            added.name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rubrics::entities::FeedbackPolicy;
    use crate::models::rubrics::entities::fixtures::*;

    fn assert_invalid(outcome: ValidationOutcome) {
        assert!(!outcome.success);
        assert!(!outcome.message.is_empty());
    }

    #[test]
    fn test_valid_unreleased_rubric() {
        assert_eq!(
            validate_rubric(&two_criteria_rubric(), None, false),
            ValidationOutcome::ok()
        );
    }

    #[test]
    fn test_structure_errors() {
        assert_invalid(validate_rubric(&Rubric { criteria: vec![] }, None, false));

        let mut no_options = ideas_rubric();
        no_options.criteria[0].options.clear();
        assert_invalid(validate_rubric(&no_options, None, false));

        let mut duplicate_criteria = two_criteria_rubric();
        duplicate_criteria.criteria[1].name = "Ideas".to_string();
        assert_invalid(validate_rubric(&duplicate_criteria, None, false));

        let mut duplicate_options = ideas_rubric();
        duplicate_options.criteria[0].options[1].name = "Poor".to_string();
        assert_invalid(validate_rubric(&duplicate_options, None, false));

        let zero_points = Rubric {
            criteria: vec![criterion("Ideas", FeedbackPolicy::Disabled, &[("None", 0)])],
        };
        assert_invalid(validate_rubric(&zero_points, None, false));
    }

    #[test]
    fn test_unreleased_rubric_may_change_freely() {
        let current = two_criteria_rubric();
        let proposed = ideas_rubric();
        assert!(validate_rubric(&proposed, Some(&current), false).success);
    }

    #[test]
    fn test_released_rubric_unchanged_is_valid() {
        let current = two_criteria_rubric();
        assert!(validate_rubric(&current.clone(), Some(&current), true).success);
    }

    #[test]
    fn test_released_rubric_may_gain_options() {
        let current = ideas_rubric();
        let mut proposed = current.clone();
        proposed.criteria[0].options.push(option("Outstanding", 7));
        proposed.criteria[0].prompt = "How original are the ideas?".to_string();
        assert!(validate_rubric(&proposed, Some(&current), true).success);
    }

    #[test]
    fn test_released_rubric_rejects_incompatible_changes() {
        let current = two_criteria_rubric();

        let mut removed_criterion = current.clone();
        removed_criterion.criteria.pop();
        assert_invalid(validate_rubric(&removed_criterion, Some(&current), true));

        let mut removed_option = current.clone();
        removed_option.criteria[0].options.remove(0);
        assert_invalid(validate_rubric(&removed_option, Some(&current), true));

        let mut renamed_option = current.clone();
        renamed_option.criteria[1].options[1].name = "Crisp".to_string();
        assert_invalid(validate_rubric(&renamed_option, Some(&current), true));

        let mut repointed = current.clone();
        repointed.criteria[0].options[2].points = 10;
        assert_invalid(validate_rubric(&repointed, Some(&current), true));

        let mut added_criterion = current.clone();
        added_criterion.criteria.push(criterion(
            "Style",
            FeedbackPolicy::Disabled,
            &[("Plain", 0), ("Elegant", 1)],
        ));
        assert_invalid(validate_rubric(&added_criterion, Some(&current), true));
    }
}
