// src/scraper/course_codes.rs

use regex::Regex;
use std::{collections::BTreeSet, sync::LazyLock};

static FULL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)\d+$").unwrap());

/// 展开以 `/` 分隔的课程代码简写。
///
/// 形如 `COMP6843` 的完整代码会原样加入，并把其字母部分记为当前前缀；
/// 其余片段直接拼接在当前前缀之后。出现在任何前缀之前的片段被丢弃。
///
/// ```
/// use echo_dl::scraper::course_codes::expand;
/// let codes = expand("COMP6843/9417");
/// assert!(codes.contains("COMP6843") && codes.contains("COMP9417"));
/// ```
pub fn expand(raw: &str) -> BTreeSet<String> {
    let mut codes = BTreeSet::new();
    let mut prefix: Option<&str> = None;

    for part in raw.split('/').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(caps) = FULL_CODE_RE.captures(part) {
            prefix = caps.get(1).map(|m| m.as_str());
            codes.insert(part.to_string());
        } else if let Some(prefix) = prefix {
            codes.insert(format!("{}{}", prefix, part));
        }
    }

    codes
}
