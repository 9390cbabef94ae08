// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、导入器构造、测试文件生成等功能
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, XlsxError};
use std::error::Error;
use tempfile::NamedTempFile;
use test_result_import::config::ConfigManager;
use test_result_import::db;
use test_result_import::importer::TestResultImporterImpl;
use test_result_import::repository::TestResultRepositoryImpl;

/// V2 布局表头（11 列）
pub const V2_HEADER: [&str; 11] = [
    "Task",
    "Part",
    "Serial",
    "TaskName",
    "TestPart",
    "TestPartDesc",
    "Value",
    "Unit",
    "TestDateTime",
    "StoreLocation",
    "CreatedBy",
];

/// V1 布局表头（9 列）
pub const V1_HEADER: [&str; 9] = [
    "Task",
    "TaskName",
    "TestPart",
    "TestPartDesc",
    "Value",
    "Unit",
    "TestDateTime",
    "Part",
    "Serial",
];

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建测试用导入器（仓储与配置各自持有连接）
pub fn create_test_importer(
    db_path: &str,
) -> TestResultImporterImpl<TestResultRepositoryImpl, ConfigManager> {
    let repo = TestResultRepositoryImpl::new(db_path).expect("Failed to create repository");
    let config = ConfigManager::new(db_path).expect("Failed to create ConfigManager");
    TestResultImporterImpl::new(repo, config)
}

/// 写入配置项
pub fn set_config(db_path: &str, key: &str, value: &str) {
    ConfigManager::new(db_path)
        .unwrap()
        .set_config_value(key, value)
        .unwrap();
}

/// 安装触发器: test_part 等于指定值时拒绝写入（模拟存储失败）
pub fn install_reject_trigger(db_path: &str, test_part: &str) {
    let conn = Connection::open(db_path).unwrap();
    conn.execute_batch(&format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS reject_test_part
        BEFORE INSERT ON test_result_clean
        WHEN NEW.test_part = '{}'
        BEGIN
            SELECT RAISE(ABORT, 'storage rejected row');
        END;
        "#,
        test_part
    ))
    .unwrap();
}

/// 统计已落库结果数
pub fn count_results(db_path: &str) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM test_result_clean", [], |row| row.get(0))
        .unwrap()
}

/// 统计批次审计数
pub fn count_batches(db_path: &str) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM import_batch", [], |row| row.get(0))
        .unwrap()
}

/// 生成 V2 布局数据行（只关心核心列）
pub fn v2_row(task: &str, test_part: &str, value: &str, date: &str) -> Vec<String> {
    vec![
        task, "P-1", "S-1", "Leak", test_part, "desc", value, "bar", date, "WH1", "alice",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// 生成 CSV 文件内容（含表头）
pub fn build_csv(header: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

/// 生成 V2 布局 CSV
pub fn build_v2_csv(rows: &[Vec<String>]) -> Vec<u8> {
    build_csv(&V2_HEADER, rows)
}

/// Excel 单元格
pub enum XlsxCell {
    Text(&'static str),
    Number(f64),
    DateTime {
        y: u16,
        m: u8,
        d: u8,
        h: u16,
        mi: u8,
        s: u8,
    },
    Blank,
}

/// 生成 .xlsx 文件内容（第一个工作表，含表头）
pub fn build_xlsx(header: &[&str], rows: &[Vec<XlsxCell>]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy hh:mm:ss");
    let sheet = workbook.add_worksheet();

    for (col, title) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                XlsxCell::Text(text) => {
                    sheet.write_string(r, c, *text)?;
                }
                XlsxCell::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                XlsxCell::DateTime { y, m, d, h, mi, s } => {
                    let dt = ExcelDateTime::from_ymd(*y, *m, *d)?.and_hms(*h, *mi, *s)?;
                    sheet.write_datetime_with_format(r, c, &dt, &date_format)?;
                }
                XlsxCell::Blank => {}
            }
        }
    }

    workbook.save_to_buffer()
}
