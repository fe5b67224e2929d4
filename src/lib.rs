// src/lib.rs

pub mod browser;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod models;
pub mod scraper;
pub mod symbols;
pub mod ui;
pub mod utils;
pub mod workflows;

use crate::{
    browser::{ChromeOptions, ChromeSession},
    cli::Cli,
    config::AppConfig,
    error::{AppError, AppResult},
};
use colored::*;
use log::{debug, info};
use std::{sync::Arc, time::Duration};

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>) -> AppResult<()> {
    logging::setup_logging(args.log_level)?;
    debug!("CLI 参数: {:?}", args);

    if args.login_help {
        ui::box_message(
            "登录 Echo360 指南",
            constants::HELP_LOGIN_GUIDE
                .lines()
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .as_slice(),
            |s| s.cyan(),
        );
        println!(
            "\n{} 可以用 --profile-dir 保存浏览器登录状态，下次运行无需重新登录。",
            *symbols::INFO
        );
        return Ok(());
    }

    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    let session = ChromeSession::launch(&ChromeOptions {
        headless: args.headless,
        profile_dir: args.profile_dir.clone(),
    })
    .await?;

    let work = async {
        ui::info(&format!(
            "请在浏览器窗口中完成登录 (最多等待 {} 秒)，按 {} 可随时退出。",
            args.login_timeout,
            *symbols::CTRL_C
        ));
        session
            .wait_for_login(
                &config.login_url,
                &config.courses_url,
                Duration::from_secs(args.login_timeout),
            )
            .await?;
        println!("{} 登录成功。", *symbols::OK);

        let report = workflows::run_pipeline(&session, config.clone(), args.list).await?;
        info!(
            "运行结束: {} 门课程, {} 个课时, {} 个视频",
            report.catalog.course_count(),
            report.catalog.lecture_count(),
            report.catalog.video_count()
        );
        match report.download_stats {
            Some(stats) if stats.failed > 0 => Err(AppError::Retrieval(format!(
                "{} 个视频下载失败",
                stats.failed
            ))),
            _ => Ok(()),
        }
    };
    // 中断时丢弃进行中的任务 (临时文件随之删除)，仍然正常关闭浏览器
    let result = workflows::interruptible(work, ctrl_c_pressed()).await;

    session.shutdown().await;
    result
}

async fn ctrl_c_pressed() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!("无法监听 Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
