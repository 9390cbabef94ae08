// ==========================================
// 测试结果导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类:
// - Format: 文件不可读 / 无数据行（不触达存储）
// - Validation: 行级错误汇总（任一行出错即阻断整批）
// - Storage: 连接 / 约束 / 事务失败（整批回滚）
// ==========================================

use crate::domain::test_result::RowError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("{0}")]
    Format(String),

    // ===== 数据校验错误 =====
    #[error("{}", join_row_errors(.0))]
    Validation(Vec<RowError>),

    // ===== 存储错误 =====
    #[error("Database error: {0}")]
    Storage(String),

    // ===== 配置错误 =====
    #[error("配置读取失败: {0}")]
    Config(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 行级错误列表（仅 Validation 有值）
    pub fn row_errors(&self) -> &[RowError] {
        match self {
            ImportError::Validation(errors) => errors,
            _ => &[],
        }
    }

    /// 是否为调用方可修正的错误（4xx 语义）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportError::Format(_) | ImportError::Validation(_)
        )
    }
}

/// 行级错误按 "; " 拼接
fn join_row_errors(errors: &[RowError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Format(format!("Error reading file: {}", err))
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::Format(format!("Error reading Excel file: {}", err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Format(format!("Error reading CSV file: {}", err))
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::Storage(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_semicolon_joined() {
        let err = ImportError::Validation(vec![
            RowError::new(2, "TestPart is empty"),
            RowError::new(4, "Invalid Task value 'abc'"),
        ]);

        assert_eq!(
            err.to_string(),
            "Row 2: TestPart is empty; Row 4: Invalid Task value 'abc'"
        );
        assert_eq!(err.row_errors().len(), 2);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_storage_error_keeps_underlying_message() {
        let err = ImportError::from(RepositoryError::DatabaseQueryError("disk I/O".to_string()));
        assert!(err.to_string().starts_with("Database error: "));
        assert!(err.to_string().contains("disk I/O"));
        assert!(!err.is_client_error());
    }
}
