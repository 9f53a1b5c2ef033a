//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 每个错误归属于三层之一：请求错误、工作流错误、内部错误，
//! 对应不同的日志级别和面向用户的提示。

use std::fmt;

use tracing::{error, warn};

/// 错误层级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTier {
    /// 调用方提供的数据不合法，可由用户修正
    Request,
    /// 依赖的工作流查询或更新失败，重试整个操作通常可以恢复
    Workflow,
    /// 意外的存储失败
    Internal,
}

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - tier() 方法 - 返回错误层级
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_assessment_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $tier:ident)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum AssessmentError {
            $($variant(String),)*
        }

        impl AssessmentError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(AssessmentError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(AssessmentError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误层级
            pub fn tier(&self) -> ErrorTier {
                match self {
                    $(AssessmentError::$variant(_) => ErrorTier::$tier,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(AssessmentError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl AssessmentError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        AssessmentError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_assessment_errors! {
    Request("E001", "Request Error", Request),
    Workflow("E002", "Workflow Error", Workflow),
    Internal("E003", "Internal Error", Internal),
    DatabaseConfig("E004", "Database Configuration Error", Internal),
    DatabaseConnection("E005", "Database Connection Error", Internal),
    DatabaseOperation("E006", "Database Operation Error", Internal),
    Serialization("E007", "Serialization Error", Internal),
    DateParse("E008", "Date Parse Error", Request),
    NotFound("E009", "Resource Not Found", Workflow),
}

pub const WORKFLOW_RETRY_MESSAGE: &str = "Could not update workflow status. Please try again.";
pub const INTERNAL_FAILURE_MESSAGE: &str =
    "An internal error occurred while processing the assessment.";

impl AssessmentError {
    /// 面向最终用户的提示
    ///
    /// 请求错误原样返回；工作流错误只提示重试；内部错误不泄露任何细节。
    pub fn user_message(&self) -> String {
        match self.tier() {
            ErrorTier::Request => self.message().to_string(),
            ErrorTier::Workflow => WORKFLOW_RETRY_MESSAGE.to_string(),
            ErrorTier::Internal => INTERNAL_FAILURE_MESSAGE.to_string(),
        }
    }

    /// 按层级记录日志，请求错误不记录
    pub fn report(&self, context: &str) {
        match self.tier() {
            ErrorTier::Request => {}
            ErrorTier::Workflow => warn!(code = self.code(), "{context}: {}", self.message()),
            ErrorTier::Internal => error!(code = self.code(), "{context}: {}", self.message()),
        }
    }

    /// 将非请求类错误归入工作流层
    pub fn into_workflow(self) -> Self {
        match self.tier() {
            ErrorTier::Request => self,
            _ => AssessmentError::Workflow(self.message().to_string()),
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AssessmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AssessmentError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AssessmentError {
    fn from(err: sea_orm::DbErr) -> Self {
        AssessmentError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AssessmentError {
    fn from(err: serde_json::Error) -> Self {
        AssessmentError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for AssessmentError {
    fn from(err: chrono::ParseError) -> Self {
        AssessmentError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AssessmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AssessmentError::request("test").code(), "E001");
        assert_eq!(AssessmentError::workflow("test").code(), "E002");
        assert_eq!(AssessmentError::internal("test").code(), "E003");
        assert_eq!(AssessmentError::database_operation("test").code(), "E006");
    }

    #[test]
    fn test_error_tiers() {
        assert_eq!(AssessmentError::request("x").tier(), ErrorTier::Request);
        assert_eq!(AssessmentError::date_parse("x").tier(), ErrorTier::Request);
        assert_eq!(AssessmentError::not_found("x").tier(), ErrorTier::Workflow);
        assert_eq!(
            AssessmentError::database_connection("x").tier(),
            ErrorTier::Internal
        );
    }

    #[test]
    fn test_user_message_hides_internal_details() {
        let err = AssessmentError::database_operation("UNIQUE constraint failed: assessments");
        assert_eq!(err.user_message(), INTERNAL_FAILURE_MESSAGE);
        assert!(!err.user_message().contains("UNIQUE"));

        let err = AssessmentError::workflow("workflow row missing");
        assert_eq!(err.user_message(), WORKFLOW_RETRY_MESSAGE);

        let err = AssessmentError::request("Unknown option 'Great' for criterion 'Ideas'");
        assert_eq!(
            err.user_message(),
            "Unknown option 'Great' for criterion 'Ideas'"
        );
    }

    #[test]
    fn test_into_workflow_keeps_request_errors() {
        let err = AssessmentError::request("bad").into_workflow();
        assert_eq!(err.tier(), ErrorTier::Request);

        let err = AssessmentError::database_operation("timeout").into_workflow();
        assert_eq!(err.tier(), ErrorTier::Workflow);
        assert_eq!(err.message(), "timeout");
    }

    #[test]
    fn test_format_simple() {
        let err = AssessmentError::request("Invalid step ordering");
        let formatted = err.format_simple();
        assert!(formatted.contains("Request Error"));
        assert!(formatted.contains("Invalid step ordering"));
    }
}
