// ==========================================
// 测试结果导入系统 - 导入层
// ==========================================
// 职责: 表格数据 → 校验 → 查重/判定 → 事务化落库
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod cell_parser;
pub mod error;
pub mod file_parser;
pub mod orchestrator;
pub mod reconciliation;
pub mod row_validator;
pub mod test_result_importer_impl;
pub mod test_result_importer_trait;

// 重导出核心类型
pub use cell_parser::{parse_float, parse_int, parse_timestamp, TimestampSource};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use orchestrator::{BatchOptions, ImportOrchestrator};
pub use reconciliation::Reconciler;
pub use row_validator::RowValidator;
pub use test_result_importer_impl::TestResultImporterImpl;

// 重导出 Trait 接口
pub use test_result_importer_trait::{FileParser, TestResultImporter};
