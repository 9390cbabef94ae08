// ==========================================
// 测试结果导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::SheetLayout;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::Serialize;

// ==========================================
// ImportSettings - 单次导入所需的全部配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSettings {
    pub sheet_layout: SheetLayout,
    pub skip_blank_rows: bool,
    pub max_upload_bytes: usize,
    pub imported_by: String,
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取表格列布局版本
    ///
    /// # 默认值
    /// - V2（11 列）
    ///
    /// # 错误
    /// - 配置值既不是 V1 也不是 V2 时报错（不静默回退）
    async fn get_sheet_layout(&self) -> RepositoryResult<SheetLayout>;

    /// 获取上传文件大小上限（字节）
    ///
    /// # 默认值
    /// - 10 MiB
    async fn get_max_upload_bytes(&self) -> RepositoryResult<usize>;

    /// 是否跳过整行空白的数据行
    ///
    /// # 默认值
    /// - true
    async fn get_skip_blank_rows(&self) -> RepositoryResult<bool>;

    /// 批次审计中的导入人
    ///
    /// # 默认值
    /// - system
    async fn get_imported_by(&self) -> RepositoryResult<String>;

    /// 一次性读取导入所需的全部配置
    ///
    /// 默认实现逐项调用上面的方法；实现者可覆盖为单次读取
    async fn get_import_settings(&self) -> RepositoryResult<ImportSettings> {
        Ok(ImportSettings {
            sheet_layout: self.get_sheet_layout().await?,
            skip_blank_rows: self.get_skip_blank_rows().await?,
            max_upload_bytes: self.get_max_upload_bytes().await?,
            imported_by: self.get_imported_by().await?,
        })
    }
}
