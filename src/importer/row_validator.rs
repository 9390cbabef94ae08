// ==========================================
// 测试结果导入系统 - 行校验器
// ==========================================
// 职责: RawRow → ValidatedRecord 或行级错误列表
// 规则:
// - Task 必须解析为非零整数（0 视为无效值，而非缺省）
// - TestPart 去空白后不可为空
// - TestDateTime 必须能按首选或回退格式解析
// - Value 解析失败按 0.0 处理，不报错
// - 其余文本字段缺失时为空串
// ==========================================

use crate::domain::test_result::{RawRow, RowError, ValidatedRecord};
use crate::domain::types::{ColumnMap, SheetLayout};
use crate::importer::cell_parser::{
    parse_float, parse_int, parse_timestamp_with_source, TimestampSource,
};
use tracing::debug;

pub struct RowValidator {
    layout: SheetLayout,
    columns: ColumnMap,
}

impl RowValidator {
    pub fn new(layout: SheetLayout) -> Self {
        Self {
            layout,
            columns: layout.columns(),
        }
    }

    pub fn layout(&self) -> SheetLayout {
        self.layout
    }

    /// 校验单行
    ///
    /// # 返回
    /// - Ok(record): 该行零错误
    /// - Err(errors): 该行全部错误（按列顺序：Task → TestPart → TestDateTime）
    pub fn validate_row(&self, row: &RawRow) -> Result<ValidatedRecord, Vec<RowError>> {
        let cols = &self.columns;
        let mut errors = Vec::new();

        let raw_task = row.cell(cols.task).trim();
        let task = match parse_int(raw_task) {
            Some(task) if task != 0 => task,
            _ => {
                errors.push(RowError::new(
                    row.row_number,
                    format!("Invalid Task value '{}'", raw_task),
                ));
                0
            }
        };

        let test_part = row.cell(cols.test_part).trim().to_string();
        if test_part.is_empty() {
            errors.push(RowError::new(row.row_number, "TestPart is empty"));
        }

        let raw_date = row.cell(cols.test_date_time).trim();
        let test_date_time = match parse_timestamp_with_source(raw_date) {
            Some((value, source)) => {
                if source == TimestampSource::Fallback {
                    debug!(
                        row = row.row_number,
                        raw = raw_date,
                        "日期未匹配首选格式，按回退格式解析"
                    );
                }
                Some(value)
            }
            None => {
                errors.push(RowError::new(
                    row.row_number,
                    format!("Invalid date format '{}'", raw_date),
                ));
                None
            }
        };

        let value = parse_float(row.cell(cols.value)).unwrap_or(0.0);

        match test_date_time {
            Some(test_date_time) if errors.is_empty() => Ok(ValidatedRecord {
                row_number: row.row_number,
                task,
                task_name: text(row, Some(cols.task_name)),
                test_part,
                test_part_desc: text(row, Some(cols.test_part_desc)),
                value,
                unit: text(row, Some(cols.unit)),
                test_date_time,
                part: text(row, Some(cols.part)),
                serial: text(row, Some(cols.serial)),
                store_location: text(row, cols.store_location),
                created_by: text(row, cols.created_by),
            }),
            _ => Err(errors),
        }
    }
}

fn text(row: &RawRow, index: Option<usize>) -> String {
    index
        .map(|i| row.cell(i).trim().to_string())
        .unwrap_or_default()
}
