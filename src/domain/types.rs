// ==========================================
// 测试结果导入系统 - 领域类型定义
// ==========================================
// 职责: 结果状态 / 表格列布局版本
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 结果状态 (Result Status)
// ==========================================
// PASS: value >= 0
// FAIL: value < 0
// DUPLICATE: (task, test_part, date_tested) 已存在
// 序列化格式: SCREAMING_SNAKE_CASE (与接口/数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Pass,      // 合格
    Fail,      // 不合格
    Duplicate, // 重复（不落库）
}

impl ResultStatus {
    /// 按测试值判定 PASS / FAIL（0 视为 PASS）
    pub fn from_value(value: f64) -> Self {
        if value < 0.0 {
            ResultStatus::Fail
        } else {
            ResultStatus::Pass
        }
    }

    /// 单字符状态码（落库 result_status 列）
    ///
    /// DUPLICATE 不落库，因此返回 None
    pub fn status_char(&self) -> Option<char> {
        match self {
            ResultStatus::Pass => Some('P'),
            ResultStatus::Fail => Some('F'),
            ResultStatus::Duplicate => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Pass => "PASS",
            ResultStatus::Fail => "FAIL",
            ResultStatus::Duplicate => "DUPLICATE",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 表格列布局 (Sheet Layout)
// ==========================================
// V2: 11 列（规范布局，默认）
//   Task | Part | Serial | TaskName | TestPart | TestPartDesc | Value | Unit
//   | TestDateTime | StoreLocation | CreatedBy
// V1: 9 列（旧布局，仅在配置显式指定时使用，不做自动识别）
//   Task | TaskName | TestPart | TestPartDesc | Value | Unit | TestDateTime
//   | Part | Serial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetLayout {
    V1,
    #[default]
    V2,
}

/// 列位置（0 基）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub task: usize,
    pub task_name: usize,
    pub test_part: usize,
    pub test_part_desc: usize,
    pub value: usize,
    pub unit: usize,
    pub test_date_time: usize,
    pub part: usize,
    pub serial: usize,
    pub store_location: Option<usize>,
    pub created_by: Option<usize>,
}

impl SheetLayout {
    pub fn columns(&self) -> ColumnMap {
        match self {
            SheetLayout::V1 => ColumnMap {
                task: 0,
                task_name: 1,
                test_part: 2,
                test_part_desc: 3,
                value: 4,
                unit: 5,
                test_date_time: 6,
                part: 7,
                serial: 8,
                store_location: None,
                created_by: None,
            },
            SheetLayout::V2 => ColumnMap {
                task: 0,
                part: 1,
                serial: 2,
                task_name: 3,
                test_part: 4,
                test_part_desc: 5,
                value: 6,
                unit: 7,
                test_date_time: 8,
                store_location: Some(9),
                created_by: Some(10),
            },
        }
    }

    /// 该布局使用的列数
    pub fn column_count(&self) -> usize {
        match self {
            SheetLayout::V1 => 9,
            SheetLayout::V2 => 11,
        }
    }

    /// 从配置值解析（不区分大小写）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "V1" => Some(SheetLayout::V1),
            "V2" => Some(SheetLayout::V2),
            _ => None,
        }
    }
}

impl fmt::Display for SheetLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetLayout::V1 => write!(f, "V1"),
            SheetLayout::V2 => write!(f, "V2"),
        }
    }
}
