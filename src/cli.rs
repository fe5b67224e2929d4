// src/cli.rs

use crate::{constants, models::Variant};
use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true,
)]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 只列出课程目录，不进入课程页面
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub list: bool,
    /// 显示登录说明并退出
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub login_help: bool,

    // --- 下载选项 (Options) ---
    /// 要下载的课程代码，可重复或用逗号分隔 (例如 COMP6843,COMP9417)；不指定则处理全部课程
    #[arg(short = 'c', long = "course", value_name = "CODE", help_heading = "Options")]
    pub courses: Vec<String>,
    /// 要下载的视频变体 SRC:QUALITY，可重复 (例如 1:HD)
    #[arg(short = 'v', long = "variant", value_name = "SRC:QUALITY", help_heading = "Options")]
    pub variants: Vec<Variant>,
    /// 覆盖配置文件中的内容服务器地址 (用于在网络日志中识别视频请求)
    #[arg(long, value_name = "HOST", help_heading = "Options")]
    pub content_host: Option<String>,
    /// 强制重新下载已存在的文件
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub force_redownload: bool,
    /// 设置最大并发下载数
    #[arg(short, long, value_parser = clap::value_parser!(usize), help_heading = "Options")]
    pub workers: Option<usize>,
    /// 设置文件保存目录
    #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::DEFAULT_SAVE_DIR), help_heading = "Options")]
    pub output: PathBuf,

    // --- 浏览器选项 (Browser) ---
    /// 以无界面模式启动浏览器 (需要已有登录状态的用户目录)
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Browser")]
    pub headless: bool,
    /// 浏览器用户数据目录，可复用已登录的会话
    #[arg(long, value_name = "DIR", help_heading = "Browser")]
    pub profile_dir: Option<PathBuf>,
    /// 等待手动登录的最长时间 (秒)
    #[arg(long, value_name = "SECS", default_value_t = constants::DEFAULT_LOGIN_TIMEOUT_SECS, help_heading = "Browser")]
    pub login_timeout: u64,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
