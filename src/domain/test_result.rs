// ==========================================
// 测试结果导入系统 - 测试结果领域模型
// ==========================================
// 生命周期:
// RawRow → ValidatedRecord（行校验）→ PersistedResult（查重/判定）
// → PreviewEntry（汇入 ImportReport，返回调用方，不落库）
// ==========================================

use crate::domain::types::ResultStatus;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RawRow - 原始行
// ==========================================
// 用途: 文件解析产物，单元格已 TRIM，保留原始行号（1 基，含表头行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(row_number: usize, cells: Vec<String>) -> Self {
        Self { row_number, cells }
    }

    /// 按列位置取值，超出实际列数时视为空串
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(|s| s.as_str()).unwrap_or("")
    }

    /// 整行是否全部为空白
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

// ==========================================
// ValidatedRecord - 校验通过的记录
// ==========================================
// 不变量:
// - test_part 非空白
// - test_date_time 为合法时间
// - 任一校验失败的行不会构造出本结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub row_number: usize,
    pub task: i32,
    pub task_name: String,
    pub test_part: String,
    pub test_part_desc: String,
    pub value: f64,
    pub unit: String,
    pub test_date_time: NaiveDateTime,
    pub part: String,
    pub serial: String,
    pub store_location: String,
    pub created_by: String,
}

impl ValidatedRecord {
    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey {
            task: self.task,
            test_part: self.test_part.clone(),
            test_date_time: self.test_date_time,
        }
    }
}

// ==========================================
// DuplicateKey - 查重键
// ==========================================
// (task, test_part, date_tested) 三元组，时间精确匹配
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub task: i32,
    pub test_part: String,
    pub test_date_time: NaiveDateTime,
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task={}, test_part={}, date_tested={}",
            self.task, self.test_part, self.test_date_time
        )
    }
}

// ==========================================
// RowError - 行级错误
// ==========================================
// 任一行级错误都会阻断整个批次（不是仅跳过该行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            row_number,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row_number, self.message)
    }
}

// ==========================================
// PersistedResult - 对账结果
// ==========================================
// 对账时创建一次，之后不再修改（无 setter）
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedResult {
    record: ValidatedRecord,
    status: ResultStatus,
}

impl PersistedResult {
    pub fn new(record: ValidatedRecord, status: ResultStatus) -> Self {
        Self { record, status }
    }

    pub fn record(&self) -> &ValidatedRecord {
        &self.record
    }

    pub fn status(&self) -> ResultStatus {
        self.status
    }

    /// DUPLICATE 不落库，只计入 duplicate_count
    pub fn is_persisted(&self) -> bool {
        self.status != ResultStatus::Duplicate
    }
}

// ==========================================
// PreviewEntry - 预览条目
// ==========================================
// 接口形状: {task, testPart, testDate, value, status}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEntry {
    pub task: i32,
    pub test_part: String,
    pub test_date: NaiveDateTime,
    pub value: f64,
    pub status: ResultStatus,
}

impl From<&PersistedResult> for PreviewEntry {
    fn from(result: &PersistedResult) -> Self {
        let record = result.record();
        Self {
            task: record.task,
            test_part: record.test_part.clone(),
            test_date: record.test_date_time,
            value: record.value,
            status: result.status(),
        }
    }
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
// preview 顺序 = 输入行顺序（与状态无关）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub total_rows: usize,
    pub imported_count: usize,
    pub duplicate_count: usize,
    pub preview: Vec<PreviewEntry>,
}

// ==========================================
// ImportBatch - 导入批次审计记录
// ==========================================
// 对齐: import_batch 表，与结果行同一事务写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: Option<String>,
    pub total_rows: i64,
    pub imported_rows: i64,
    pub duplicate_rows: i64,
    pub imported_at: DateTime<Utc>,
    pub imported_by: String,
    pub elapsed_ms: i64,
}

// ==========================================
// StoredTestResult - 已落库的测试结果
// ==========================================
// 对齐: test_result_clean 表（只读查询用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTestResult {
    pub test_result_id: i64,
    pub batch_id: String,
    pub part: String,
    pub serial: String,
    pub task: i32,
    pub run_number: i32,
    pub test_part: String,
    pub date_tested: NaiveDateTime,
    pub test_value: f64,
    pub test_unit: String,
    pub result_status: String,
    pub result_text: String,
    pub test_info1: String,
    pub test_info2: String,
    pub store_location: String,
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_record(value: f64) -> ValidatedRecord {
        ValidatedRecord {
            row_number: 2,
            task: 1001,
            task_name: "Leak".to_string(),
            test_part: "TP-01".to_string(),
            test_part_desc: String::new(),
            value,
            unit: "bar".to_string(),
            test_date_time: NaiveDate::from_ymd_opt(2023, 12, 31)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
            part: String::new(),
            serial: String::new(),
            store_location: String::new(),
            created_by: String::new(),
        }
    }

    #[test]
    fn test_raw_row_missing_cells_are_empty() {
        let row = RawRow::new(2, vec!["1".to_string(), "A".to_string()]);
        assert_eq!(row.cell(1), "A");
        assert_eq!(row.cell(10), "");
        assert!(!row.is_blank());
        assert!(RawRow::new(3, vec!["".to_string(), "  ".to_string()]).is_blank());
    }

    #[test]
    fn test_row_error_display() {
        let err = RowError::new(2, "TestPart is empty");
        assert_eq!(err.to_string(), "Row 2: TestPart is empty");
    }

    #[test]
    fn test_preview_entry_wire_shape() {
        let result = PersistedResult::new(sample_record(-3.0), ResultStatus::Fail);
        let entry = PreviewEntry::from(&result);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["task"], 1001);
        assert_eq!(json["testPart"], "TP-01");
        assert_eq!(json["testDate"], "2023-12-31T09:05:00");
        assert_eq!(json["value"], -3.0);
        assert_eq!(json["status"], "FAIL");
    }

    #[test]
    fn test_duplicate_result_not_persisted() {
        let dup = PersistedResult::new(sample_record(1.0), ResultStatus::Duplicate);
        assert!(!dup.is_persisted());
        let pass = PersistedResult::new(sample_record(1.0), ResultStatus::Pass);
        assert!(pass.is_persisted());
    }
}
