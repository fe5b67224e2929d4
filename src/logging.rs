// src/logging.rs

use crate::{
    cli::LogLevel,
    config::file::log_file_path,
    error::{AppError, AppResult},
};
use anyhow::anyhow;
use std::fs;

/// 按 `--log-level` 初始化日志文件；`off` 时不做任何事。
pub fn setup_logging(level: LogLevel) -> AppResult<()> {
    if level == LogLevel::Off {
        return Ok(());
    }
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level.into())
        // chromiumoxide 在 debug 级别会输出每条 CDP 消息
        .level_for("chromiumoxide", log::LevelFilter::Warn)
        .level_for("tungstenite", log::LevelFilter::Warn)
        .chain(fern::log_file(&path)?)
        .apply()
        .map_err(|e| AppError::Other(anyhow!("初始化日志失败: {}", e)))?;
    log::info!("日志已写入: {}", path.display());
    Ok(())
}
