// ==========================================
// 测试结果导入系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods) / CSV (.csv)
// 约定: 仅读取第一个工作表；第 1 行为表头，数据从第 2 行开始
// ==========================================

use crate::domain::test_result::RawRow;
use crate::importer::cell_parser::EXACT_TIMESTAMP_FORMAT;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::test_result_importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser {
    skip_blank_rows: bool,
}

impl ExcelParser {
    pub fn new(skip_blank_rows: bool) -> Self {
        Self { skip_blank_rows }
    }
}

impl Default for ExcelParser {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::Format("No worksheet found in Excel file".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // Range 可能不从 A1 开始，按绝对坐标取值
        let (last_row, last_col) = match range.end() {
            Some(end) if end.0 >= 1 => end,
            _ => {
                return Err(ImportError::Format(
                    "No data rows found in Excel file".to_string(),
                ))
            }
        };

        let mut rows = Vec::new();
        for r in 1..=last_row {
            let cells: Vec<String> = (0..=last_col)
                .map(|c| {
                    range
                        .get_value((r, c))
                        .map(cell_to_string)
                        .unwrap_or_default()
                })
                .collect();

            let row = RawRow::new(r as usize + 1, cells);
            if self.skip_blank_rows && row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ImportError::Format(
                "No data rows found in Excel file".to_string(),
            ));
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "Excel 解析完成");
        Ok(rows)
    }
}

/// 单元格 → 字符串（已 TRIM）
///
/// 日期单元格按首选时间格式输出，保证与文本日期走同一解析路径
fn cell_to_string(cell: &Data) -> String {
    let text = match cell {
        Data::Empty => String::new(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => value.format(EXACT_TIMESTAMP_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        other => other.to_string(),
    };
    text.trim().to_string()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    skip_blank_rows: bool,
}

impl CsvParser {
    pub fn new(skip_blank_rows: bool) -> Self {
        Self { skip_blank_rows }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 表头行只做消费，不参与列定位
        reader.headers()?;

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|pos| record_start_line(bytes, pos))
                .unwrap_or(idx + 2);
            let cells: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            let row = RawRow::new(row_number, cells);
            if self.skip_blank_rows && row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ImportError::Format(
                "No data rows found in CSV file".to_string(),
            ));
        }

        debug!(rows = rows.len(), "CSV 解析完成");
        Ok(rows)
    }
}

/// 记录内容所在的物理行号（1 基）
///
/// csv 记录的 Position 指向上一条记录结束处；其后被跳过的空行在此补算，
/// 引号内换行已计入 Position 的行号
fn record_start_line(bytes: &[u8], pos: &csv::Position) -> usize {
    let mut line = pos.line() as usize;
    for b in bytes.iter().skip(pos.byte() as usize) {
        match b {
            b'\n' => line += 1,
            b'\r' => {}
            _ => break,
        }
    }
    line
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser {
    skip_blank_rows: bool,
}

impl UniversalFileParser {
    pub fn new(skip_blank_rows: bool) -> Self {
        Self { skip_blank_rows }
    }

    /// 解析上传内容
    ///
    /// 无文件名或无扩展名时按 Excel 处理（calamine 按内容识别格式）
    pub fn parse(&self, file_name: Option<&str>, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        if bytes.is_empty() {
            return Err(ImportError::Format("File is empty".to_string()));
        }

        let ext = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser::new(self.skip_blank_rows).parse_bytes(bytes),
            "" | "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => {
                ExcelParser::new(self.skip_blank_rows).parse_bytes(bytes)
            }
            _ => Err(ImportError::Format(format!(
                "Unsupported file format '.{}' (expected .xlsx, .xlsm, .xls, .xlsb, .ods or .csv)",
                ext
            ))),
        }
    }
}

impl Default for UniversalFileParser {
    fn default() -> Self {
        Self::new(true)
    }
}
