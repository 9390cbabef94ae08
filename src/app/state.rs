// ==========================================
// 测试结果导入系统 - 应用状态
// ==========================================
// 职责: 数据库路径解析、共享 API 实例创建
// ==========================================

use crate::api::{ApiResult, ImportApi};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "TEST_RESULT_IMPORT_DB_PATH";

/// 获取默认数据库路径
///
/// # 顺序
/// 1. 环境变量 TEST_RESULT_IMPORT_DB_PATH
/// 2. 用户数据目录 / test-result-import / test_result_import.db
/// 3. ./test_result_import.db
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./test_result_import.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("test-result-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("test_result_import.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 打开数据库并创建共享的 ImportApi
pub fn open_import_api(db_path: &str) -> ApiResult<Arc<ImportApi>> {
    info!(db_path = %db_path, "使用数据库");
    Ok(Arc::new(ImportApi::new(db_path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_override_wins() {
        std::env::set_var(DB_PATH_ENV, "  /tmp/override.db ");
        assert_eq!(get_default_db_path(), "/tmp/override.db");
        std::env::remove_var(DB_PATH_ENV);
    }
}
