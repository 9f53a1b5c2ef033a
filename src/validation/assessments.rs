use std::collections::HashSet;

use super::ValidationOutcome;
use crate::models::steps::entities::{StepName, StepSpec};

/// 校验评估步骤配置
///
/// 目前只允许 `[peer, self]` 与 `[self]` 两种顺序。
pub fn validate_assessments(steps: &[StepSpec]) -> ValidationOutcome {
    check_assessments(steps).into()
}

fn check_assessments(steps: &[StepSpec]) -> Result<(), String> {
    if steps.is_empty() {
        return Err("This problem must include at least one assessment step.".to_string());
    }

    let mut names = Vec::with_capacity(steps.len());
    let mut seen = HashSet::new();
    for spec in steps {
        let name = spec
            .name
            .parse::<StepName>()
            .map_err(|e| e.message().to_string())?;
        if !seen.insert(name) {
            return Err(format!(
                "The '{name}' assessment step may only appear once."
            ));
        }
        names.push(name);
    }

    let legal = matches!(
        names.as_slice(),
        [StepName::Peer, StepName::SelfAssessment] | [StepName::SelfAssessment]
    );
    if !legal {
        return Err(
            "Assessment steps must be a peer assessment followed by a self assessment, \
             or a self assessment only."
                .to_string(),
        );
    }

    for spec in steps.iter().filter(|s| s.name == StepName::PEER) {
        match spec.must_grade {
            None => return Err("The peer step requires a 'must_grade' value.".to_string()),
            Some(0) => return Err("The 'must_grade' value must be at least 1.".to_string()),
            Some(_) => {}
        }
        match spec.must_be_graded_by {
            None => {
                return Err("The peer step requires a 'must_be_graded_by' value.".to_string());
            }
            Some(0) => {
                return Err("The 'must_be_graded_by' value must be at least 1.".to_string());
            }
            Some(_) => {}
        }
    }

    Ok(())
}
