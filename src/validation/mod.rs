//! 配置校验
//!
//! 评分标准、评估步骤与日期配置在持久化之前必须通过校验。
//! 所有校验函数均为纯函数：不产生副作用，不访问外部服务。

mod assessments;
mod dates;
mod rubric;

pub use assessments::validate_assessments;
pub use dates::{DateRange, DateStatus, parse_date, validate_dates};
pub use rubric::validate_rubric;

use serde::Serialize;

/// 校验结果
///
/// 成功时 `message` 为空，失败时一定非空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub success: bool,
    pub message: String,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        let message = message.into();
        debug_assert!(!message.is_empty());
        Self {
            success: false,
            message,
        }
    }
}

impl<E: Into<String>> From<Result<(), E>> for ValidationOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(message) => Self::fail(message),
        }
    }
}
