// ==========================================
// 测试结果导入系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod test_result;
pub mod types;

// 重导出核心类型
pub use test_result::{
    DuplicateKey, ImportBatch, ImportReport, PersistedResult, PreviewEntry, RawRow, RowError,
    StoredTestResult, ValidatedRecord,
};
pub use types::{ColumnMap, ResultStatus, SheetLayout};
