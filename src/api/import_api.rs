// ==========================================
// 测试结果导入API
// ==========================================
// 职责: 封装导入相关功能，供 HTTP 接口 / 命令行调用
// 响应形状: {importedRows, duplicateRows, preview: [{task, testPart, testDate, value, status}]}
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::test_result::{ImportBatch, ImportReport, PreviewEntry};
use crate::importer::{TestResultImporter, TestResultImporterImpl};
use crate::repository::{TestResultRepository, TestResultRepositoryImpl};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// 导入API响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiResponse {
    /// 新落库的记录数
    pub imported_rows: usize,
    /// 判定为重复、未落库的记录数
    pub duplicate_rows: usize,
    /// 逐行预览（与输入行顺序一致）
    pub preview: Vec<PreviewEntry>,
}

impl From<ImportReport> for ImportApiResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            imported_rows: report.imported_count,
            duplicate_rows: report.duplicate_count,
            preview: report.preview,
        }
    }
}

type DefaultImporter = TestResultImporterImpl<TestResultRepositoryImpl, ConfigManager>;

/// 导入API
pub struct ImportApi {
    importer: DefaultImporter,
    config: ConfigManager,
}

impl ImportApi {
    /// 打开数据库（不存在则建表）并创建 ImportApi
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建（仓储与配置共享同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ApiError::DatabaseError(format!("数据库锁获取失败: {}", e)))?;
            init_schema(&guard).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        }

        let config = ConfigManager::from_connection(conn.clone())?;
        let repo = TestResultRepositoryImpl::from_connection(conn);

        Ok(Self {
            importer: TestResultImporterImpl::new(repo, config.clone()),
            config,
        })
    }

    /// 导入上传的文件内容
    ///
    /// # 参数
    /// - file_name: 原始文件名（可选）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError): InvalidInput / ValidationError → 4xx，其余 → 5xx
    pub async fn import_upload(
        &self,
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> ApiResult<ImportApiResponse> {
        let report = self.importer.import_from_bytes(file_name, bytes).await?;
        Ok(report.into())
    }

    /// 导入本地文件（每个文件独立成批，并发执行）
    pub async fn import_files<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ApiResult<ImportApiResponse>> {
        self.importer
            .batch_import(file_paths)
            .await
            .into_iter()
            .map(|result| result.map(ImportApiResponse::from).map_err(ApiError::from))
            .collect()
    }

    /// 查询最近的导入批次
    pub fn recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let batches = self.importer.repository().get_recent_batches(limit)?;
        info!(count = batches.len(), "查询导入批次");
        Ok(batches)
    }

    /// 上传大小上限（字节）
    pub async fn max_upload_bytes(&self) -> ApiResult<usize> {
        Ok(self.config.get_max_upload_bytes().await?)
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }
}
