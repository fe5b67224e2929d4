// src/utils.rs

use crate::{constants, error::*, models::Variant};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use itertools::Itertools;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use std::{
    collections::BTreeSet,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static FIRST_INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// 去掉文件名中的非法字符。对正常的课程代码与数字不做任何改动。
pub fn sanitize_filename(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return "unknown".to_string();
    }
    let name = ILLEGAL_CHARS_RE.replace_all(name, " ");
    let name = WHITESPACE_RE.replace_all(&name, "_");
    let name = name.trim_matches(|c: char| c == '.' || c == '_').to_string();
    if name.is_empty() { "unnamed".to_string() } else { name }
}

/// 生成视频文件名，格式固定，供下游工具按名解析：
/// `{代码以-连接}_Lecture-{n}_{yyyy}-{mm}-{dd}-{HH}-{MM}_Source-{s}_Quality-{q}.{ext}`
///
/// 只有课程代码部分来自页面文本，也只对这一部分做清理。
pub fn lecture_file_name(
    course_codes: &BTreeSet<String>,
    lecture_num: u32,
    date: NaiveDate,
    start_time: NaiveTime,
    variant: Variant,
    extension: &str,
) -> String {
    let codes = sanitize_filename(&course_codes.iter().join("-"));
    format!(
        "{}_Lecture-{}_{:04}-{:02}-{:02}-{:02}-{:02}_Source-{}_Quality-{}.{}",
        codes,
        lecture_num,
        date.year(),
        date.month(),
        date.day(),
        start_time.hour(),
        start_time.minute(),
        variant.source,
        variant.quality,
        extension
    )
}

pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}

/// 取文本中的第一个整数，例如 "10 classes" -> 10。
pub fn first_integer(text: &str) -> Option<u32> {
    FIRST_INTEGER_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// 计算文件完整内容的 SHA-256，返回小写十六进制字符串。
pub fn calculate_file_sha256(path: &Path) -> AppResult<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0; constants::DIGEST_BUFFER_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 { break; }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quality, SourceNum};
    use std::io::Write;

    fn codes(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lecture_file_name() {
        let name = lecture_file_name(
            &codes(&["COMP9417", "COMP6843"]),
            7,
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(9, 5, 0).unwrap(),
            Variant::new(SourceNum::PRIMARY, Quality::HD),
            "mp4",
        );
        // 课程代码按字典序排列，月/日/时/分补零
        assert_eq!(name, "COMP6843-COMP9417_Lecture-7_2024-03-04-09-05_Source-1_Quality-HD.mp4");
    }

    #[test]
    fn test_lecture_file_name_is_deterministic() {
        let make = || {
            lecture_file_name(
                &codes(&["MATH1131", "MATH1141"]),
                12,
                NaiveDate::from_ymd_opt(2023, 11, 30).unwrap(),
                NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
                Variant::new(SourceNum::SECONDARY, Quality::SD),
                "mp4",
            )
        };
        assert_eq!(make(), make());
        assert_eq!(make(), "MATH1131-MATH1141_Lecture-12_2023-11-30-16-30_Source-2_Quality-SD.mp4");
    }

    #[test]
    fn test_lecture_file_name_cleans_only_codes() {
        let name = lecture_file_name(
            &codes(&[" COMP6843 ", "MATH:1131"]),
            1,
            NaiveDate::from_ymd_opt(2024, 2, 12).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            Variant::new(SourceNum::PRIMARY, Quality::HD),
            "mp4",
        );
        assert_eq!(name, "COMP6843_-MATH_1131_Lecture-1_2024-02-12-14-00_Source-1_Quality-HD.mp4");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("COMP6843_Lecture-1.mp4"), "COMP6843_Lecture-1.mp4");
        assert_eq!(sanitize_filename("a/b:c"), "a_b_c");
        assert_eq!(sanitize_filename(" . "), "unnamed");
        assert_eq!(sanitize_filename(""), "unknown");
    }

    #[test]
    fn test_first_integer() {
        assert_eq!(first_integer("10"), Some(10));
        assert_eq!(first_integer("  24 classes"), Some(24));
        assert_eq!(first_integer("no classes"), None);
    }

    #[test]
    fn test_calculate_file_sha256() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        assert_eq!(
            calculate_file_sha256(file.path()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
