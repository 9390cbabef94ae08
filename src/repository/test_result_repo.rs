// ==========================================
// 测试结果导入系统 - 测试结果 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::test_result::{
    DuplicateKey, ImportBatch, PersistedResult, StoredTestResult,
};
use crate::repository::error::RepositoryResult;

// ==========================================
// DuplicateLookup Trait
// ==========================================
// 用途: 对账引擎查重能力（只读）
pub trait DuplicateLookup {
    /// 查重键是否已存在于存储中
    ///
    /// # 返回
    /// - Ok(true): 已存在
    /// - Ok(false): 不存在
    fn exists(&self, key: &DuplicateKey) -> RepositoryResult<bool>;
}

// ==========================================
// BatchWriter Trait
// ==========================================
// 用途: 批次事务内的查重 + 写入
// 生命周期: 仅在 `with_transaction` 闭包内有效
pub trait BatchWriter: DuplicateLookup {
    /// 写入一条测试结果（DUPLICATE 结果不可写入）
    fn insert_result(&mut self, batch_id: &str, result: &PersistedResult) -> RepositoryResult<()>;

    /// 写入批次审计记录
    fn insert_batch(&mut self, batch: &ImportBatch) -> RepositoryResult<()>;
}

// ==========================================
// TestResultRepository Trait
// ==========================================
// 实现者: TestResultRepositoryImpl（使用 rusqlite）
pub trait TestResultRepository: Send + Sync {
    /// 在单个事务内执行整批写入
    ///
    /// # 语义
    /// - 闭包返回 Ok: 提交事务
    /// - 闭包返回 Err / panic: 回滚事务，部分写入对外不可见
    fn with_transaction<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut dyn BatchWriter) -> RepositoryResult<T>;

    /// 按查重键查询已落库记录
    fn find_by_key(&self, key: &DuplicateKey) -> RepositoryResult<Option<StoredTestResult>>;

    /// 统计 test_result_clean 表记录数
    fn count_results(&self) -> RepositoryResult<usize>;

    /// 查询最近的导入批次
    fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}
