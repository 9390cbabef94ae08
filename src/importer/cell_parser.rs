// ==========================================
// 测试结果导入系统 - 单元格解析器
// ==========================================
// 职责: 原始单元格字符串 → 类型化值（整数 / 浮点 / 时间）
// 红线: 纯函数，无副作用；是否接受 0 值由调用方决定
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// 首选时间格式: 日/月/年 时:分:秒（24 小时制，小时不要求补零）
pub const EXACT_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// 回退时间格式（与区域设置无关）
const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// 回退日期格式（时间取 00:00:00）
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// 时间值的解析来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Exact,
    Fallback,
}

/// 解析整数
///
/// 空串 / 非数字 → None（调用方按 0 处理）
pub fn parse_int(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i32>().ok()
}

/// 解析浮点数
///
/// # 规则
/// - 小数点固定为 '.'，',' 视为千分位分隔符
/// - NaN / Infinity 视为无效
pub fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized: String = trimmed.chars().filter(|c| *c != ',').collect();
    let value = normalized.parse::<f64>().ok()?;

    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// 解析时间
///
/// 先按首选格式精确匹配，失败后走回退格式
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    parse_timestamp_with_source(raw).map(|(value, _)| value)
}

/// 解析时间并返回命中的来源
pub fn parse_timestamp_with_source(raw: &str) -> Option<(NaiveDateTime, TimestampSource)> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, EXACT_TIMESTAMP_FORMAT) {
        return Some((value, TimestampSource::Exact));
    }

    parse_fallback(trimmed).map(|value| (value, TimestampSource::Fallback))
}

fn parse_fallback(s: &str) -> Option<NaiveDateTime> {
    // 带时区偏移的时间统一换算到 UTC
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(s, format) {
            return Some(value);
        }
    }

    for format in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("1001"), Some(1001));
        assert_eq!(parse_int("  -7 "), Some(-7));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int("12.5"), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("5.0"), Some(5.0));
        assert_eq!(parse_float("-3"), Some(-3.0));
        assert_eq!(parse_float(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("n/a"), None);
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("inf"), None);
    }

    #[test]
    fn test_exact_format_without_hour_padding() {
        let parsed = parse_timestamp_with_source("31/12/2023 9:05:00").unwrap();
        assert_eq!(parsed, (ts(2023, 12, 31, 9, 5, 0), TimestampSource::Exact));

        let parsed = parse_timestamp_with_source("01/02/2024 23:59:59").unwrap();
        assert_eq!(parsed.0, ts(2024, 2, 1, 23, 59, 59));
    }

    #[test]
    fn test_fallback_formats() {
        let parsed = parse_timestamp_with_source("2023-12-31T09:05:00").unwrap();
        assert_eq!(parsed, (ts(2023, 12, 31, 9, 5, 0), TimestampSource::Fallback));

        assert_eq!(
            parse_timestamp("2023-12-31 09:05:00.250").map(|t| t.and_utc().timestamp_subsec_millis()),
            Some(250)
        );
        assert_eq!(parse_timestamp("2023-12-31 09:05"), Some(ts(2023, 12, 31, 9, 5, 0)));
        assert_eq!(parse_timestamp("2023-12-31"), Some(ts(2023, 12, 31, 0, 0, 0)));
        assert_eq!(
            parse_timestamp("2023-12-31T10:05:00+01:00"),
            Some(ts(2023, 12, 31, 9, 5, 0))
        );
    }

    #[test]
    fn test_invalid_timestamps() {
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("32/12/2023 9:05:00"), None);
        assert_eq!(parse_timestamp("31/12/2023 25:00:00"), None);
    }
}
