use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationOutcome;
use crate::errors::{AssessmentError, Result};

/// 解析日期字符串
///
/// 支持 RFC 3339，以及不带时区的 `YYYY-MM-DDTHH:MM:SS[.f]`、`YYYY-MM-DD HH:MM:SS`、
/// `YYYY-MM-DD`（均按 UTC 处理）。
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(naive.and_utc());
    }
    Err(AssessmentError::date_parse(format!(
        "'{value}' is not a valid date"
    )))
}

fn parse_optional(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(parse_date).transpose()
}

/// 日期区间，缺失的边界表示无限制
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub due: Option<DateTime<Utc>>,
}

/// 某一时刻相对于日期区间的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStatus {
    NotStarted,
    Open,
    Closed,
}

impl DateRange {
    pub fn parse(start: Option<&str>, due: Option<&str>) -> Result<Self> {
        Ok(Self {
            start: parse_optional(start)?,
            due: parse_optional(due)?,
        })
    }

    /// 步骤区间缺失的边界继承整体区间
    pub fn inherit(&self, overall: &DateRange) -> DateRange {
        DateRange {
            start: self.start.or(overall.start),
            due: self.due.or(overall.due),
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> DateStatus {
        if self.start.is_some_and(|start| now < start) {
            DateStatus::NotStarted
        } else if self.due.is_some_and(|due| now > due) {
            DateStatus::Closed
        } else {
            DateStatus::Open
        }
    }
}

/// 校验整体日期与各步骤日期
///
/// 各步骤区间独立校验，不限制步骤之间的先后顺序。
pub fn validate_dates(
    overall_start: Option<&str>,
    overall_due: Option<&str>,
    step_ranges: &[(Option<&str>, Option<&str>)],
) -> ValidationOutcome {
    check_dates(overall_start, overall_due, step_ranges)
        .map_err(|e| e.message().to_string())
        .into()
}

fn check_dates(
    overall_start: Option<&str>,
    overall_due: Option<&str>,
    step_ranges: &[(Option<&str>, Option<&str>)],
) -> Result<()> {
    let overall = DateRange::parse(overall_start, overall_due)?;
    let steps = step_ranges
        .iter()
        .map(|(start, due)| DateRange::parse(*start, *due))
        .collect::<Result<Vec<_>>>()?;

    if let (Some(start), Some(due)) = (overall.start, overall.due)
        && start > due
    {
        return Err(AssessmentError::request(
            "The start date must be on or before the due date.",
        ));
    }

    for (index, step) in steps.iter().enumerate() {
        let position = index + 1;
        if let (Some(start), Some(overall_start)) = (step.start, overall.start)
            && start < overall_start
        {
            return Err(AssessmentError::request(format!(
                "Step {position} cannot start before the problem start date."
            )));
        }
        if let (Some(due), Some(overall_due)) = (step.due, overall.due)
            && due > overall_due
        {
            return Err(AssessmentError::request(format!(
                "Step {position} cannot be due after the problem due date."
            )));
        }

        let resolved = step.inherit(&overall);
        if let (Some(start), Some(due)) = (resolved.start, resolved.due)
            && start > due
        {
            return Err(AssessmentError::request(format!(
                "Step {position} start date must be on or before its due date."
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2014-01-01 .. 2014-01-14，与索引一一对应
    fn day(n: u32) -> String {
        format!("2014-01-{:02}T00:00:00+00:00", n + 1)
    }

    fn validate(
        start: Option<u32>,
        due: Option<u32>,
        ranges: &[(Option<u32>, Option<u32>)],
    ) -> ValidationOutcome {
        let start = start.map(day);
        let due = due.map(day);
        let ranges: Vec<(Option<String>, Option<String>)> = ranges
            .iter()
            .map(|(s, d)| (s.map(day), d.map(day)))
            .collect();
        let borrowed: Vec<(Option<&str>, Option<&str>)> = ranges
            .iter()
            .map(|(s, d)| (s.as_deref(), d.as_deref()))
            .collect();
        validate_dates(start.as_deref(), due.as_deref(), &borrowed)
    }

    #[test]
    fn test_valid_nested_ranges() {
        let outcome = validate(
            Some(0),
            Some(13),
            &[(Some(0), Some(5)), (Some(3), Some(9)), (Some(6), Some(13))],
        );
        assert_eq!(outcome, ValidationOutcome::ok());
    }

    #[test]
    fn test_absent_dates_are_unconstrained() {
        assert!(validate(None, None, &[(None, None), (None, None)]).success);
        assert!(validate(None, Some(10), &[(Some(2), None), (None, Some(4))]).success);
        assert!(validate(Some(1), None, &[(Some(5), Some(6))]).success);
    }

    #[test]
    fn test_steps_may_overlap() {
        let outcome = validate(
            Some(0),
            Some(13),
            &[(Some(4), Some(10)), (Some(0), Some(6)), (Some(2), Some(3))],
        );
        assert!(outcome.success, "{}", outcome.message);
    }

    #[test]
    fn test_ordering_violations() {
        for outcome in [
            validate(Some(5), Some(2), &[]),
            validate(None, None, &[(Some(6), Some(2))]),
            validate(Some(3), Some(10), &[(Some(1), Some(5))]),
            validate(Some(3), Some(10), &[(Some(4), Some(12))]),
            validate(Some(8), None, &[(None, Some(5))]),
            validate(None, Some(4), &[(Some(6), None)]),
        ] {
            assert!(!outcome.success);
            assert!(!outcome.message.is_empty());
        }
    }

    #[test]
    fn test_invalid_date_format() {
        let valid = day(0);
        let valid = Some(valid.as_str());

        assert!(!validate_dates(Some("invalid"), valid, &[(valid, valid)]).success);
        assert!(!validate_dates(valid, Some("invalid"), &[(valid, valid)]).success);
        assert!(!validate_dates(valid, valid, &[(Some("invalid"), valid)]).success);
        assert!(!validate_dates(valid, valid, &[(valid, Some("invalid"))]).success);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = parse_date("2014-03-02T00:00:00Z").unwrap();
        assert_eq!(parse_date("2014-03-02").unwrap(), expected);
        assert_eq!(parse_date("2014-03-02T00:00:00").unwrap(), expected);
        assert_eq!(parse_date("2014-03-02 00:00:00").unwrap(), expected);
        assert_eq!(parse_date("2014-03-02T01:00:00+01:00").unwrap(), expected);
        assert!(parse_date("03/02/2014").is_err());
    }

    #[test]
    fn test_status_at() {
        let range = DateRange::parse(Some(day(2).as_str()), Some(day(5).as_str())).unwrap();
        assert_eq!(range.status_at(parse_date(&day(1)).unwrap()), DateStatus::NotStarted);
        assert_eq!(range.status_at(parse_date(&day(3)).unwrap()), DateStatus::Open);
        assert_eq!(range.status_at(parse_date(&day(6)).unwrap()), DateStatus::Closed);
        assert_eq!(DateRange::default().status_at(Utc::now()), DateStatus::Open);
    }

    #[test]
    fn test_inherit() {
        let overall = DateRange::parse(Some(day(0).as_str()), Some(day(9).as_str())).unwrap();
        let step = DateRange::parse(None, Some(day(4).as_str())).unwrap();
        let resolved = step.inherit(&overall);
        assert_eq!(resolved.start, overall.start);
        assert_eq!(resolved.due, step.due);
    }
}
