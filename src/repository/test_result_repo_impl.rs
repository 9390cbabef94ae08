// ==========================================
// 测试结果导入系统 - 测试结果 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::test_result::{
    DuplicateKey, ImportBatch, PersistedResult, StoredTestResult,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::test_result_repo::{BatchWriter, DuplicateLookup, TestResultRepository};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const SELECT_RESULT_COLUMNS: &str = r#"
    SELECT test_result_id, batch_id, part, serial, task, run_number, test_part,
           date_tested, test_value, test_unit, result_status, result_text,
           test_info1, test_info2, store_location, created_by
    FROM test_result_clean
"#;

fn map_stored_result(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredTestResult> {
    Ok(StoredTestResult {
        test_result_id: row.get(0)?,
        batch_id: row.get(1)?,
        part: row.get(2)?,
        serial: row.get(3)?,
        task: row.get(4)?,
        run_number: row.get(5)?,
        test_part: row.get(6)?,
        date_tested: row.get(7)?,
        test_value: row.get(8)?,
        test_unit: row.get(9)?,
        result_status: row.get(10)?,
        result_text: row.get(11)?,
        test_info1: row.get(12)?,
        test_info2: row.get(13)?,
        store_location: row.get(14)?,
        created_by: row.get(15)?,
    })
}

// ==========================================
// TestResultRepositoryImpl
// ==========================================
#[derive(Clone)]
pub struct TestResultRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl TestResultRepositoryImpl {
    /// 创建新的 Repository 实例
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

    /// 从已有连接创建（与 ConfigManager 共享同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl TestResultRepository for TestResultRepositoryImpl {
    fn with_transaction<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn BatchWriter) -> RepositoryResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        // IMMEDIATE: 事务开始即持有写锁，查重与写入之间不会被其他批次插入
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let outcome = {
            let mut writer = SqliteBatchWriter { tx: &tx };
            f(&mut writer)
        };

        match outcome {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                debug!("批次事务已提交");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "批次事务回滚失败");
                } else {
                    warn!(error = %e, "批次事务已回滚");
                }
                Err(e)
            }
        }
    }

    fn find_by_key(&self, key: &DuplicateKey) -> RepositoryResult<Option<StoredTestResult>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let sql = format!(
            "{} WHERE task = ?1 AND test_part = ?2 AND date_tested = ?3 LIMIT 1",
            SELECT_RESULT_COLUMNS
        );
        let result = conn
            .query_row(
                &sql,
                params![key.task, key.test_part, key.test_date_time],
                map_stored_result,
            )
            .optional()?;

        Ok(result)
    }

    fn count_results(&self) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM test_result_clean", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, file_name, total_rows, imported_rows, duplicate_rows,
                   imported_at, imported_by, elapsed_ms
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;

        let batches = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ImportBatch {
                    batch_id: row.get(0)?,
                    file_name: row.get(1)?,
                    total_rows: row.get(2)?,
                    imported_rows: row.get(3)?,
                    duplicate_rows: row.get(4)?,
                    imported_at: row.get(5)?,
                    imported_by: row.get(6)?,
                    elapsed_ms: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }
}

// ==========================================
// SqliteBatchWriter - 事务内写入器
// ==========================================
struct SqliteBatchWriter<'t, 'c> {
    tx: &'t Transaction<'c>,
}

impl DuplicateLookup for SqliteBatchWriter<'_, '_> {
    fn exists(&self, key: &DuplicateKey) -> RepositoryResult<bool> {
        let mut stmt = self.tx.prepare_cached(
            r#"
            SELECT 1 FROM test_result_clean
            WHERE task = ?1 AND test_part = ?2 AND date_tested = ?3
            LIMIT 1
            "#,
        )?;

        let found = stmt
            .query_row(
                params![key.task, key.test_part, key.test_date_time],
                |_row| Ok(()),
            )
            .optional()?;

        Ok(found.is_some())
    }
}

impl BatchWriter for SqliteBatchWriter<'_, '_> {
    fn insert_result(&mut self, batch_id: &str, result: &PersistedResult) -> RepositoryResult<()> {
        let status_char = result.status().status_char().ok_or_else(|| {
            RepositoryError::BusinessRuleViolation(format!(
                "重复记录不可落库: {}",
                result.record().duplicate_key()
            ))
        })?;
        let record = result.record();

        let mut stmt = self.tx.prepare_cached(
            r#"
            INSERT INTO test_result_clean (
                batch_id, part, serial, task, run_number, test_part, date_tested,
                test_value, test_unit, result_status, result_text,
                test_info1, test_info2, store_location, created_by, imported_at
            ) VALUES (
                ?1, ?2, ?3, ?4, 1, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15
            )
            "#,
        )?;

        stmt.execute(params![
            batch_id,
            record.part,
            record.serial,
            record.task,
            record.test_part,
            record.test_date_time,
            record.value,
            record.unit,
            status_char.to_string(),
            result.status().as_str(),
            record.task_name,
            record.test_part_desc,
            record.store_location,
            record.created_by,
            Utc::now(),
        ])?;

        Ok(())
    }

    fn insert_batch(&mut self, batch: &ImportBatch) -> RepositoryResult<()> {
        self.tx.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, total_rows, imported_rows, duplicate_rows,
                imported_at, imported_by, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.total_rows,
                batch.imported_rows,
                batch.duplicate_rows,
                batch.imported_at,
                batch.imported_by,
                batch.elapsed_ms,
            ],
        )?;

        Ok(())
    }
}
