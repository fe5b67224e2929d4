// src/scraper/lecture_row.rs

//! 课时行与下载对话框中文本的固定格式解析。

use crate::{
    error::{AppError, AppResult},
    models::{Quality, SourceNum},
    utils,
};
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

static TIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2}):(\d{2})\s*([ap]m)\s*[-–]\s*(\d{1,2}):(\d{2})\s*([ap]m)\s*$")
        .unwrap()
});
static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(MB|GB)").unwrap());

/// 解析形如 `February 19, 2024` 的日期。
pub fn parse_date(text: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%B %d, %Y")
        .map_err(|e| AppError::Parse(format!("无法解析日期 '{}': {}", text.trim(), e)))
}

/// 解析形如 `2:00pm-4:00pm` 的时间段，返回 24 小时制的开始与结束时间。
pub fn parse_time_range(text: &str) -> AppResult<(NaiveTime, NaiveTime)> {
    let caps = TIME_RANGE_RE
        .captures(text)
        .ok_or_else(|| AppError::Parse(format!("无法解析时间段 '{}'", text.trim())))?;
    let start = to_naive_time(&caps[1], &caps[2], &caps[3])?;
    let end = to_naive_time(&caps[4], &caps[5], &caps[6])?;
    Ok((start, end))
}

fn to_naive_time(hour: &str, minute: &str, meridiem: &str) -> AppResult<NaiveTime> {
    let invalid = || AppError::Parse(format!("无效的时间 '{}:{}{}'", hour, minute, meridiem));
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&hour) {
        return Err(invalid());
    }
    let hour = match (meridiem.eq_ignore_ascii_case("pm"), hour) {
        (false, 12) => 0,
        (false, h) => h,
        (true, 12) => 12,
        (true, h) => h + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// 从清晰度选项的文字中取出清晰度和大小，例如 `Full Quality (1.2 GB)` -> (HD, "1.2 GB")。
pub fn parse_quality_label(label: &str) -> AppResult<(Quality, String)> {
    let caps = SIZE_RE
        .captures(label)
        .ok_or_else(|| AppError::Parse(format!("清晰度选项中没有文件大小: '{}'", label.trim())))?;
    Ok((Quality::from_label(label), format!("{} {}", &caps[1], &caps[2])))
}

/// 视频源标签中的第一个数字即源编号，例如 `Source 2`。
pub fn parse_source_label(label: &str) -> AppResult<SourceNum> {
    let num = utils::first_integer(label)
        .ok_or_else(|| AppError::Parse(format!("视频源标签中没有编号: '{}'", label.trim())))?;
    SourceNum::new(num)
}
