//! general query log 解析的工具函数

use crate::error::{AnalyzerError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;

/// 默认制表符宽度
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// 将制表符按列展开为空格。
///
/// 日志依靠列位置区分续行与边界行，因此展开必须按制表位对齐，而不是简单替换。
/// 不含制表符的行直接借用返回。
#[must_use]
pub fn expand_tabs(line: &str, width: usize) -> Cow<'_, str> {
    if !line.contains('\t') {
        return Cow::Borrowed(line);
    }
    let width = width.max(1);
    let mut out = String::with_capacity(line.len() + width * 2);
    let mut column = 0usize;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = width - column % width;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    Cow::Owned(out)
}

/// 解析边界行上的时间戳（`YYMMDD H:MM:SS`，小时可能以空格补齐）。
///
/// 日期或时间不合法时返回 `None`。
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let mut parts = raw.split_whitespace();
    let date = parts.next()?;
    let time = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%y%m%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    Some(date.and_time(time))
}

/// 解析 `YYYY-MM-DD` 形式的 breakoff 日期
pub fn parse_breakoff(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| AnalyzerError::breakoff(value, e))
}
