// ==========================================
// 测试结果导入系统 - 测试结果导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 读配置 → 解析 → 校验 → 查重/判定 → 落库（单事务）
// 说明: 解析与数据库访问均为阻塞 IO，放入 spawn_blocking 执行
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::test_result::ImportReport;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::orchestrator::{BatchOptions, ImportOrchestrator};
use crate::importer::test_result_importer_trait::TestResultImporter;
use crate::repository::error::RepositoryError;
use crate::repository::test_result_repo::TestResultRepository;
use async_trait::async_trait;
use std::path::Path;
use tracing::{error, info, instrument};

// ==========================================
// TestResultImporterImpl - 测试结果导入器实现
// ==========================================
pub struct TestResultImporterImpl<R, C>
where
    R: TestResultRepository + Clone + 'static,
    C: ImportConfigReader,
{
    // 数据访问层
    repo: R,

    // 配置读取器
    config: C,
}

impl<R, C> TestResultImporterImpl<R, C>
where
    R: TestResultRepository + Clone + 'static,
    C: ImportConfigReader,
{
    /// 创建新的 TestResultImporter 实例
    ///
    /// # 参数
    /// - repo: 测试结果仓储
    /// - config: 配置读取器
    pub fn new(repo: R, config: C) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

#[async_trait]
impl<R, C> TestResultImporter for TestResultImporterImpl<R, C>
where
    R: TestResultRepository + Clone + 'static,
    C: ImportConfigReader,
{
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn import_from_bytes(
        &self,
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> ImportResult<ImportReport> {
        // === 步骤 1: 读取配置（阻塞线程池） ===
        let settings = self
            .config
            .get_import_settings()
            .await
            .map_err(config_error)?;

        if bytes.len() > settings.max_upload_bytes {
            return Err(ImportError::Format(format!(
                "File exceeds maximum upload size of {} bytes",
                settings.max_upload_bytes
            )));
        }

        let layout = settings.sheet_layout;
        let skip_blank_rows = settings.skip_blank_rows;
        info!(layout = %layout, "开始导入测试结果");

        // === 步骤 2: 解析 + 编排（阻塞 IO） ===
        let repo = self.repo.clone();
        let options = BatchOptions {
            file_name: file_name.clone(),
            imported_by: settings.imported_by,
        };

        let outcome = tokio::task::spawn_blocking(move || {
            let rows = UniversalFileParser::new(skip_blank_rows)
                .parse(options.file_name.as_deref(), &bytes)?;
            ImportOrchestrator::new(repo, layout).import_batch_with(rows, &options)
        })
        .await
        .map_err(|e| ImportError::InternalError(format!("导入任务异常终止: {}", e)))?;

        if let Err(e) = &outcome {
            error!(error = %e, "测试结果导入失败");
        }

        outcome
    }

    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<ImportReport> {
        let path = file_path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());

        let bytes = tokio::fs::read(path).await?;
        self.import_from_bytes(file_name, bytes).await
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportReport>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        // 为每个文件创建导入任务
        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                info!(file = %path_str, "开始导入文件");
                let result = self.import_from_file(path).await;
                match &result {
                    Ok(report) => info!(
                        file = %path_str,
                        imported = report.imported_count,
                        duplicates = report.duplicate_count,
                        "文件导入成功"
                    ),
                    Err(e) => error!(file = %path_str, error = %e, "文件导入失败"),
                }
                result
            }
        });

        // 并发执行所有导入任务
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}

fn config_error(err: RepositoryError) -> ImportError {
    ImportError::Config(err.to_string())
}
