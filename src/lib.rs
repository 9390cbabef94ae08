// ==========================================
// 测试结果导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + axum
// 系统定位: 表格测试数据 → 校验 → 查重/判定 → 事务化落库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析 / 校验 / 对账 / 编排
pub mod importer;

// 配置层 - 运行时配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 运行环境装配
pub mod app;

// HTTP 上传接口
pub mod web;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ColumnMap, ResultStatus, SheetLayout};

// 领域实体
pub use domain::{
    DuplicateKey, ImportBatch, ImportReport, PersistedResult, PreviewEntry, RawRow, RowError,
    ValidatedRecord,
};

// 导入器
pub use importer::{
    ImportError, ImportOrchestrator, ImportResult, Reconciler, RowValidator, TestResultImporter,
    TestResultImporterImpl,
};

// API
pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "测试结果导入系统";
