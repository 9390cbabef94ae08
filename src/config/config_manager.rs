// ==========================================
// 测试结果导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ImportConfigReader, ImportSettings};
use crate::db::open_sqlite_connection;
use crate::domain::types::SheetLayout;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 上传大小默认上限: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// 默认导入人
pub const DEFAULT_IMPORTED_BY: &str = "system";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Clone)]
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（scope_id='global'，存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取全部已写入的 global 配置（按 key 排序，供 CLI 诊断输出）
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global'")?;
        let snapshot = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(snapshot)
    }

    // ==========================================
    // 同步读取（在阻塞线程池上调用）
    // ==========================================

    fn read_sheet_layout(&self) -> RepositoryResult<SheetLayout> {
        let value = self.get_config_or_default(config_keys::SHEET_LAYOUT, "V2")?;
        SheetLayout::parse(&value).ok_or_else(|| RepositoryError::FieldValueError {
            field: config_keys::SHEET_LAYOUT.to_string(),
            message: format!("未知的列布局 '{}'（可选: V1 / V2）", value),
        })
    }

    fn read_max_upload_bytes(&self) -> RepositoryResult<usize> {
        let default = DEFAULT_MAX_UPLOAD_BYTES.to_string();
        let value = self.get_config_or_default(config_keys::MAX_UPLOAD_BYTES, &default)?;
        match value.parse::<usize>() {
            Ok(bytes) if bytes > 0 => Ok(bytes),
            _ => Err(RepositoryError::FieldValueError {
                field: config_keys::MAX_UPLOAD_BYTES.to_string(),
                message: format!("需要正整数，实际 '{}'", value),
            }),
        }
    }

    fn read_skip_blank_rows(&self) -> RepositoryResult<bool> {
        let value = self.get_config_or_default(config_keys::SKIP_BLANK_ROWS, "true")?;
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => Ok(true),
            "false" | "0" | "no" | "n" => Ok(false),
            _ => Err(RepositoryError::FieldValueError {
                field: config_keys::SKIP_BLANK_ROWS.to_string(),
                message: format!("需要布尔值，实际 '{}'", value),
            }),
        }
    }

    fn read_imported_by(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::IMPORTED_BY, DEFAULT_IMPORTED_BY)
    }

    fn read_import_settings(&self) -> RepositoryResult<ImportSettings> {
        Ok(ImportSettings {
            sheet_layout: self.read_sheet_layout()?,
            skip_blank_rows: self.read_skip_blank_rows()?,
            max_upload_bytes: self.read_max_upload_bytes()?,
            imported_by: self.read_imported_by()?,
        })
    }

    /// 在阻塞线程池上执行读取，连接被导入事务占用时不阻塞异步运行时
    async fn run_blocking<T, F>(&self, read: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ConfigManager) -> RepositoryResult<T> + Send + 'static,
    {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || read(&manager))
            .await
            .map_err(|e| {
                RepositoryError::InternalError(format!("配置读取任务异常终止: {}", e))
            })?
    }
}

// ==========================================
// ImportConfigReader 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_sheet_layout(&self) -> RepositoryResult<SheetLayout> {
        self.run_blocking(ConfigManager::read_sheet_layout).await
    }

    async fn get_max_upload_bytes(&self) -> RepositoryResult<usize> {
        self.run_blocking(ConfigManager::read_max_upload_bytes).await
    }

    async fn get_skip_blank_rows(&self) -> RepositoryResult<bool> {
        self.run_blocking(ConfigManager::read_skip_blank_rows).await
    }

    async fn get_imported_by(&self) -> RepositoryResult<String> {
        self.run_blocking(ConfigManager::read_imported_by).await
    }

    async fn get_import_settings(&self) -> RepositoryResult<ImportSettings> {
        self.run_blocking(ConfigManager::read_import_settings).await
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 文件格式
    pub const SHEET_LAYOUT: &str = "import.sheet_layout";
    pub const SKIP_BLANK_ROWS: &str = "import.skip_blank_rows";

    // 上传
    pub const MAX_UPLOAD_BYTES: &str = "import.max_upload_bytes";

    // 审计
    pub const IMPORTED_BY: &str = "import.imported_by";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    fn create_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let manager = create_manager();

        assert_eq!(manager.get_sheet_layout().await.unwrap(), SheetLayout::V2);
        assert_eq!(
            manager.get_max_upload_bytes().await.unwrap(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
        assert!(manager.get_skip_blank_rows().await.unwrap());
        assert_eq!(manager.get_imported_by().await.unwrap(), "system");
    }

    #[tokio::test]
    async fn test_overrides_are_read_back() {
        let manager = create_manager();
        manager.set_config_value(config_keys::SHEET_LAYOUT, "v1").unwrap();
        manager.set_config_value(config_keys::SKIP_BLANK_ROWS, "false").unwrap();
        manager.set_config_value(config_keys::IMPORTED_BY, "alice").unwrap();
        manager.set_config_value(config_keys::MAX_UPLOAD_BYTES, "2048").unwrap();

        assert_eq!(manager.get_sheet_layout().await.unwrap(), SheetLayout::V1);
        assert!(!manager.get_skip_blank_rows().await.unwrap());
        assert_eq!(manager.get_imported_by().await.unwrap(), "alice");
        assert_eq!(manager.get_max_upload_bytes().await.unwrap(), 2048);

        let snapshot = manager.get_config_snapshot().unwrap();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(
            snapshot.get(config_keys::IMPORTED_BY).map(String::as_str),
            Some("alice")
        );

        let settings = manager.get_import_settings().await.unwrap();
        assert_eq!(
            settings,
            ImportSettings {
                sheet_layout: SheetLayout::V1,
                skip_blank_rows: false,
                max_upload_bytes: 2048,
                imported_by: "alice".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_settings_read_keeps_runtime_responsive_while_connection_busy() {
        let manager = create_manager();

        // 另一线程长时间持有共享连接（模拟进行中的导入事务）
        let conn = manager.conn.clone();
        let (locked_tx, locked_rx) = mpsc::channel();
        let holder = std::thread::spawn(move || {
            let _guard = conn.lock().unwrap();
            locked_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(300));
        });
        locked_rx.recv().unwrap();

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let settings = manager.get_import_settings().await.unwrap();
        ticker.abort();
        holder.join().unwrap();

        assert_eq!(settings.sheet_layout, SheetLayout::V2);
        assert!(ticks.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test]
    async fn test_unknown_layout_is_rejected() {
        let manager = create_manager();
        manager.set_config_value(config_keys::SHEET_LAYOUT, "V3").unwrap();

        let err = manager.get_sheet_layout().await.unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));
    }
}
