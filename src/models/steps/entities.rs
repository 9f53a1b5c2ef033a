use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{AssessmentError, Result};
use crate::validation::{DateRange, validate_assessments, validate_dates};

/// 评估步骤名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepName {
    #[serde(rename = "peer")]
    Peer,
    #[serde(rename = "self")]
    SelfAssessment,
}

impl StepName {
    pub const PEER: &'static str = "peer";
    pub const SELF: &'static str = "self";

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Peer => Self::PEER,
            StepName::SelfAssessment => Self::SELF,
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            Self::PEER => Ok(StepName::Peer),
            Self::SELF => Ok(StepName::SelfAssessment),
            other => Err(AssessmentError::request(format!(
                "Unknown assessment step '{other}'"
            ))),
        }
    }
}

/// 原始步骤配置（未经校验）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    #[serde(default)]
    pub must_grade: Option<u32>,
    #[serde(default)]
    pub must_be_graded_by: Option<u32>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
}

impl StepSpec {
    pub fn peer(must_grade: u32, must_be_graded_by: u32) -> Self {
        Self {
            name: StepName::PEER.to_string(),
            must_grade: Some(must_grade),
            must_be_graded_by: Some(must_be_graded_by),
            ..Default::default()
        }
    }

    pub fn self_assessment() -> Self {
        Self {
            name: StepName::SELF.to_string(),
            ..Default::default()
        }
    }
}

/// 互评步骤要求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRequirements {
    // 学生需要完成的互评数量
    pub must_grade: u32,
    // 提交需要获得的互评数量
    pub must_be_graded_by: u32,
}

/// 已校验的单个步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepConfig {
    Peer(PeerRequirements),
    SelfAssessment,
}

impl StepConfig {
    pub fn name(&self) -> StepName {
        match self {
            StepConfig::Peer(_) => StepName::Peer,
            StepConfig::SelfAssessment => StepName::SelfAssessment,
        }
    }
}

/// 已校验的步骤及其开放时间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfiguredStep {
    pub config: StepConfig,
    pub window: DateRange,
}

/// 已校验的步骤序列，只可能是 `[peer, self]` 或 `[self]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentStepConfig {
    steps: Vec<ConfiguredStep>,
}

impl AssessmentStepConfig {
    /// 校验原始配置（步骤顺序与各步骤日期）并构造
    pub fn new(specs: &[StepSpec]) -> Result<Self> {
        let outcome = validate_assessments(specs);
        if !outcome.success {
            return Err(AssessmentError::request(outcome.message));
        }

        let ranges: Vec<(Option<&str>, Option<&str>)> = specs
            .iter()
            .map(|spec| (spec.start.as_deref(), spec.due.as_deref()))
            .collect();
        let outcome = validate_dates(None, None, &ranges);
        if !outcome.success {
            return Err(AssessmentError::request(outcome.message));
        }

        let steps = specs
            .iter()
            .map(|spec| {
                let config = match spec.name.parse::<StepName>()? {
                    StepName::Peer => StepConfig::Peer(PeerRequirements {
                        must_grade: spec.must_grade.unwrap_or(1),
                        must_be_graded_by: spec.must_be_graded_by.unwrap_or(1),
                    }),
                    StepName::SelfAssessment => StepConfig::SelfAssessment,
                };
                Ok(ConfiguredStep {
                    config,
                    window: DateRange::parse(spec.start.as_deref(), spec.due.as_deref())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ConfiguredStep] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<StepName> {
        self.steps.iter().map(|step| step.config.name()).collect()
    }

    pub fn peer(&self) -> Option<PeerRequirements> {
        self.steps.iter().find_map(|step| match step.config {
            StepConfig::Peer(requirements) => Some(requirements),
            StepConfig::SelfAssessment => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_name_wire_format() {
        assert_eq!(serde_json::to_string(&StepName::Peer).unwrap(), "\"peer\"");
        assert_eq!(
            serde_json::to_string(&StepName::SelfAssessment).unwrap(),
            "\"self\""
        );
        assert_eq!("self".parse::<StepName>().unwrap(), StepName::SelfAssessment);
        assert!("training".parse::<StepName>().is_err());
    }

    #[test]
    fn test_config_from_valid_specs() {
        let config =
            AssessmentStepConfig::new(&[StepSpec::peer(2, 3), StepSpec::self_assessment()])
                .unwrap();
        assert_eq!(
            config.step_names(),
            vec![StepName::Peer, StepName::SelfAssessment]
        );
        assert_eq!(
            config.peer(),
            Some(PeerRequirements {
                must_grade: 2,
                must_be_graded_by: 3
            })
        );
    }

    #[test]
    fn test_config_keeps_step_windows() {
        let peer = StepSpec {
            start: Some("2014-01-02".to_string()),
            due: Some("2014-01-05".to_string()),
            ..StepSpec::peer(1, 1)
        };
        let config = AssessmentStepConfig::new(&[peer, StepSpec::self_assessment()]).unwrap();

        let window = config.steps()[0].window;
        assert!(window.start.is_some() && window.due.is_some());
        assert_eq!(config.steps()[1].window, DateRange::default());
    }

    #[test]
    fn test_config_rejects_bad_step_dates() {
        let reversed = StepSpec {
            start: Some("2014-01-05".to_string()),
            due: Some("2014-01-02".to_string()),
            ..StepSpec::self_assessment()
        };
        let err = AssessmentStepConfig::new(&[reversed]).unwrap_err();
        assert_eq!(err.tier(), crate::errors::ErrorTier::Request);

        let garbage = StepSpec {
            due: Some("next tuesday".to_string()),
            ..StepSpec::self_assessment()
        };
        assert!(AssessmentStepConfig::new(&[garbage]).is_err());
    }

    #[test]
    fn test_config_rejects_peer_only() {
        let err = AssessmentStepConfig::new(&[StepSpec::peer(1, 1)]).unwrap_err();
        assert_eq!(err.tier(), crate::errors::ErrorTier::Request);
        assert!(!err.message().is_empty());
    }
}
