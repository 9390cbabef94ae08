// ==========================================
// 测试结果导入系统 - 应用层
// ==========================================
// 职责: 运行环境装配（数据库路径、共享 API）
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, open_import_api, DB_PATH_ENV};
