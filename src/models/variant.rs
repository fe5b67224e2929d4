// src/models/variant.rs

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// 视频清晰度。对话框中只区分 "Full Quality" 与其余选项。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quality {
    HD,
    SD,
}

impl Quality {
    pub fn from_label(label: &str) -> Self {
        if label.contains("Full Quality") {
            Quality::HD
        } else {
            Quality::SD
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::HD => "HD",
            Quality::SD => "SD",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HD" => Ok(Quality::HD),
            "SD" => Ok(Quality::SD),
            other => Err(format!("无效的清晰度 '{}'，应为 HD 或 SD", other)),
        }
    }
}

/// 视频源编号：1 为主画面，2 为副画面 (摄像头/屏幕)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SourceNum(u8);

impl SourceNum {
    pub const PRIMARY: SourceNum = SourceNum(1);
    pub const SECONDARY: SourceNum = SourceNum(2);

    pub fn new(num: u32) -> AppResult<Self> {
        match num {
            1 => Ok(Self::PRIMARY),
            2 => Ok(Self::SECONDARY),
            other => Err(AppError::Parse(format!("视频源编号必须为 1 或 2，实际为 {}", other))),
        }
    }
}

impl TryFrom<u8> for SourceNum {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SourceNum::new(value.into()).map_err(|e| e.to_string())
    }
}

impl From<SourceNum> for u8 {
    fn from(value: SourceNum) -> Self {
        value.0
    }
}

impl fmt::Display for SourceNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 视频变体 = (源编号, 清晰度)，在同一课时内唯一。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variant {
    pub source: SourceNum,
    pub quality: Quality,
}

impl Variant {
    pub fn new(source: SourceNum, quality: Quality) -> Self {
        Self { source, quality }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.quality)
    }
}

/// 解析命令行中的 `SRC:QUALITY`，例如 `1:HD`。
impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, quality) = s
            .split_once(':')
            .ok_or_else(|| format!("无效的视频变体 '{}'，格式应为 SRC:QUALITY (例如 1:HD)", s))?;
        let source = source
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("无效的视频源编号 '{}'", source))?;
        let source = SourceNum::new(source).map_err(|e| e.to_string())?;
        Ok(Variant::new(source, quality.parse()?))
    }
}
