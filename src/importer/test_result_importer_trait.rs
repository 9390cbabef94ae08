// ==========================================
// 测试结果导入系统 - 导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::domain::test_result::{ImportReport, RawRow};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// TestResultImporter Trait
// ==========================================
// 用途: 测试结果导入主接口
// 实现者: TestResultImporterImpl
#[async_trait]
pub trait TestResultImporter: Send + Sync {
    /// 从上传的文件内容导入
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于按扩展名选择解析器、批次审计）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入 / 重复计数与预览
    /// - Err(Format): 文件不可读或无数据行
    /// - Err(Validation): 任一行校验失败（整批未落库）
    /// - Err(Storage): 存储失败（整批已回滚）
    ///
    /// # 导入流程
    /// 1. 文件解析 → RawRow
    /// 2. 逐行校验（收集全部行级错误）
    /// 3. 单事务内查重 + 判定 + 落库 + 批次审计
    async fn import_from_bytes(
        &self,
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> ImportResult<ImportReport>;

    /// 从本地文件导入
    async fn import_from_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
    ) -> ImportResult<ImportReport>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件是独立的原子批次，互不影响
    /// - 返回顺序与输入顺序一致
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<ImportResult<ImportReport>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件内容 → 原始行（不含表头行）
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析文件内容为原始行
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 数据行（row_number 为表格中的绝对行号，表头为第 1 行）
    /// - Err(Format): 文件不可读、无工作表、无数据行
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>>;
}
