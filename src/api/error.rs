// ==========================================
// 测试结果导入系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入 / 仓储错误为调用方可读的错误消息
// 约定: Display 即对外返回的错误正文
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方错误（4xx）
    // ==========================================
    /// 文件不可读 / 无数据行 / 格式不支持
    #[error("{0}")]
    InvalidInput(String),

    /// 行级校验失败（"; " 拼接的行号消息）
    #[error("{0}")]
    ValidationError(String),

    // ==========================================
    // 服务端错误（5xx）
    // ==========================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 是否为调用方错误
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::InvalidInput(_) | ApiError::ValidationError(_))
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Format(msg) => ApiError::InvalidInput(msg),
            e @ ImportError::Validation(_) => ApiError::ValidationError(e.to_string()),
            ImportError::Storage(msg) => ApiError::DatabaseError(msg),
            ImportError::Config(msg) => ApiError::ConfigError(msg),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ConfigError(format!("{}: {}", field, message))
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// API层Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_result::RowError;

    #[test]
    fn test_validation_error_keeps_row_messages() {
        let err: ApiError = ImportError::Validation(vec![
            RowError::new(2, "TestPart is empty"),
            RowError::new(3, "Invalid date format 'x'"),
        ])
        .into();

        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Row 2: TestPart is empty; Row 3: Invalid date format 'x'"
        );
    }

    #[test]
    fn test_storage_error_is_server_error() {
        let err: ApiError = ImportError::Storage("UNIQUE constraint failed".to_string()).into();

        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "Database error: UNIQUE constraint failed");
    }

    #[test]
    fn test_format_error_passes_through() {
        let err: ApiError = ImportError::Format("File is empty".to_string()).into();
        assert_eq!(err.to_string(), "File is empty");
    }
}
