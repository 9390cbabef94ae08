// ==========================================
// 测试结果导入系统 - 导入编排器
// ==========================================
// 职责: 驱动整批流水线
// 阶段 1: 逐行校验，收集全部行级错误；任一错误 → 整批拒绝，不触达存储
// 阶段 2: 单事务内按行序 查重 → 判定 → 落库 → 预览；任一存储错误 → 整批回滚
// ==========================================

use crate::domain::test_result::{
    ImportBatch, ImportReport, PreviewEntry, RawRow, RowError, ValidatedRecord,
};
use crate::domain::types::SheetLayout;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::reconciliation::Reconciler;
use crate::importer::row_validator::RowValidator;
use crate::repository::test_result_repo::TestResultRepository;
use chrono::Utc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 批次元信息（写入 import_batch 审计表）
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub file_name: Option<String>,
    pub imported_by: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            imported_by: crate::config::config_manager::DEFAULT_IMPORTED_BY.to_string(),
        }
    }
}

// ==========================================
// ImportOrchestrator
// ==========================================
pub struct ImportOrchestrator<R>
where
    R: TestResultRepository,
{
    repo: R,
    validator: RowValidator,
}

impl<R> ImportOrchestrator<R>
where
    R: TestResultRepository,
{
    pub fn new(repo: R, layout: SheetLayout) -> Self {
        Self {
            repo,
            validator: RowValidator::new(layout),
        }
    }

    /// 导入一批原始行（默认批次元信息）
    pub fn import_batch(&self, rows: Vec<RawRow>) -> ImportResult<ImportReport> {
        self.import_batch_with(rows, &BatchOptions::default())
    }

    /// 导入一批原始行
    ///
    /// # 返回
    /// - Ok(ImportReport): 全部行已对账，非重复行已提交
    /// - Err(Validation): 阶段 1 失败，未落库
    /// - Err(Storage): 阶段 2 失败，已回滚
    #[instrument(
        skip(self, rows, options),
        fields(rows = rows.len(), batch_id = tracing::field::Empty)
    )]
    pub fn import_batch_with(
        &self,
        rows: Vec<RawRow>,
        options: &BatchOptions,
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();

        // === 阶段 1: 校验 ===
        let records = self.validate_all(&rows)?;
        let total_rows = records.len();

        // === 阶段 2: 单事务对账 + 落库 ===
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let report = self.repo.with_transaction(|tx| {
            let mut preview = Vec::with_capacity(total_rows);
            let mut imported_count = 0usize;
            let mut duplicate_count = 0usize;

            for record in records {
                let result = Reconciler::reconcile(record, &*tx)?;

                if result.is_persisted() {
                    tx.insert_result(&batch_id, &result)?;
                    imported_count += 1;
                } else {
                    duplicate_count += 1;
                }

                preview.push(PreviewEntry::from(&result));
            }

            tx.insert_batch(&ImportBatch {
                batch_id: batch_id.clone(),
                file_name: options.file_name.clone(),
                total_rows: total_rows as i64,
                imported_rows: imported_count as i64,
                duplicate_rows: duplicate_count as i64,
                imported_at: Utc::now(),
                imported_by: options.imported_by.clone(),
                elapsed_ms: start_time.elapsed().as_millis() as i64,
            })?;

            Ok(ImportReport {
                batch_id: batch_id.clone(),
                total_rows,
                imported_count,
                duplicate_count,
                preview,
            })
        })?;

        info!(
            batch_id = %report.batch_id,
            imported = report.imported_count,
            duplicates = report.duplicate_count,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "测试结果导入完成"
        );

        Ok(report)
    }

    /// 阶段 1: 校验全部行
    ///
    /// 错误顺序 = 行序，同一行内按字段顺序
    fn validate_all(&self, rows: &[RawRow]) -> ImportResult<Vec<ValidatedRecord>> {
        let mut records = Vec::with_capacity(rows.len());
        let mut errors: Vec<RowError> = Vec::new();

        for row in rows {
            match self.validator.validate_row(row) {
                Ok(record) => records.push(record),
                Err(row_errors) => {
                    for e in &row_errors {
                        warn!(row_number = e.row_number, error = %e.message, "行校验失败");
                    }
                    errors.extend(row_errors);
                }
            }
        }

        if !errors.is_empty() {
            warn!(
                failed_rows = errors.len(),
                layout = %self.validator.layout(),
                "校验未通过，整批拒绝"
            );
            return Err(ImportError::Validation(errors));
        }

        Ok(records)
    }
}
