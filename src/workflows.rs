// src/workflows.rs

use crate::{
    browser::BrowserSession,
    client::RobustClient,
    config::AppConfig,
    downloader::{self, DownloadManager, DownloadStats, VideoRetriever},
    error::{AppError, AppResult},
    models::{CourseCatalog, RetrievalTask},
    scraper::CourseScraper,
    symbols, ui,
};
use colored::*;
use log::{debug, info, warn};
use std::{fs, sync::Arc};

/// 一次完整运行的产物。
#[derive(Debug)]
pub struct PipelineReport {
    pub catalog: CourseCatalog,
    /// `--list` 模式或没有可下载视频时为 `None`。
    pub download_stats: Option<DownloadStats>,
}

/// 读取课程目录 → 抓取目标课程的课时与视频 → 并发下载并计算摘要。
///
/// 调用方需保证 `session` 已处于登录状态。
pub async fn run_pipeline(
    session: &dyn BrowserSession,
    config: Arc<AppConfig>,
    list_only: bool,
) -> AppResult<PipelineReport> {
    ui::print_header("读取课程目录");
    let scraper = CourseScraper::new(session, &config);
    let mut catalog = scraper.build_catalog().await?;
    print_catalog(&catalog, &config);

    if list_only {
        return Ok(PipelineReport {
            catalog,
            download_stats: None,
        });
    }

    ui::print_header("抓取课时与视频");
    let summary = scraper.scrape_targets(&mut catalog).await?;
    info!("抓取结果: {:?}", summary);
    ui::plain(&format!(
        "\n{} 课时: {} 个已读取, {} 个无录像, {} 个中断; 可下载视频 {} 个。",
        *symbols::INFO,
        summary.captured,
        summary.skipped,
        summary.abandoned,
        summary.resolved_videos
    ));

    let tasks = plan_retrievals(&catalog, &config)?;
    if tasks.is_empty() {
        ui::warn("没有可下载的视频。");
        return Ok(PipelineReport {
            catalog,
            download_stats: None,
        });
    }

    fs::create_dir_all(&config.download_dir)?;
    let shown_dir = dunce::canonicalize(&config.download_dir)
        .unwrap_or_else(|_| config.download_dir.clone());
    ui::plain(&format!("{} 保存目录: {}", *symbols::LINK, shown_dir.display()));

    let client = Arc::new(RobustClient::new(config.clone())?);
    let retriever = VideoRetriever::new(client, config.force_redownload);
    let manager = DownloadManager::new();
    manager.start_batch(tasks.len());

    let outcomes =
        downloader::execute_tasks(&retriever, &manager, tasks, config.max_workers).await;
    for outcome in outcomes {
        catalog.update_video(outcome.task.video_id, outcome.task.video)?;
    }
    manager.print_report();

    Ok(PipelineReport {
        catalog,
        download_stats: Some(manager.get_stats()),
    })
}

/// 为目录中每个已解析出地址的视频生成下载任务。
/// 先完成 `interrupt` 时放弃 `work`，返回 [`AppError::UserInterrupt`]。
pub async fn interruptible<T>(
    work: impl Future<Output = AppResult<T>>,
    interrupt: impl Future<Output = ()>,
) -> AppResult<T> {
    tokio::select! {
        result = work => result,
        _ = interrupt => {
            warn!("收到中断信号，停止剩余任务");
            Err(AppError::UserInterrupt)
        }
    }
}

pub fn plan_retrievals(catalog: &CourseCatalog, config: &AppConfig) -> AppResult<Vec<RetrievalTask>> {
    catalog
        .resolved_videos()
        .into_iter()
        .map(|(video_id, video)| {
            let filename = catalog.file_name_for(video_id, &config.video_extension)?;
            debug!("计划下载 {:?} -> {}", video_id, filename);
            Ok(RetrievalTask {
                video_id,
                filepath: config.download_dir.join(filename),
                video: video.clone(),
            })
        })
        .collect()
}

fn print_catalog(catalog: &CourseCatalog, config: &AppConfig) {
    if catalog.course_count() == 0 {
        ui::warn("课程列表为空。");
        return;
    }
    for (_, course) in catalog.courses() {
        let marker = if course.is_targeted(&config.target_course_codes) {
            "*".green()
        } else {
            " ".normal()
        };
        ui::plain(&format!(
            " {} {:<20} {} ({} T{}, {} 个课时)",
            marker,
            course.display_codes().bold(),
            course.course_name,
            course.year,
            course.term,
            course.declared_lecture_count
        ));
    }
    ui::plain(&format!(
        "\n{} 共 {} 门课程，带 {} 的课程将被处理。",
        *symbols::INFO,
        catalog.course_count(),
        "*".green()
    ));
}
