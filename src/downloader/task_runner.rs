// src/downloader/task_runner.rs

use super::{
    DownloadManager,
    retriever::{RetrievalOutcome, VideoRetriever},
};
use crate::{constants, models::*, symbols, ui, utils};
use colored::Colorize;
use futures::{StreamExt, stream};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::cmp::min;

/// 以有限并发执行一批下载任务，返回每个任务的结果 (顺序与完成顺序一致)。
pub async fn execute_tasks(
    retriever: &VideoRetriever,
    manager: &DownloadManager,
    tasks: Vec<RetrievalTask>,
    max_workers: usize,
) -> Vec<RetrievalOutcome> {
    let max_workers = min(max_workers.max(1), tasks.len());
    if max_workers == 0 {
        return Vec::new();
    }

    ui::plain("");
    ui::info(&format!(
        "开始下载 {} 个视频 (并发数: {})...",
        tasks.len(),
        max_workers
    ));
    let multi = MultiProgress::new();
    let main_pbar = setup_progress_bar(&multi, tasks.len() as u64);

    let outcomes = stream::iter(tasks)
        .map(|task| retriever.process(task, &multi))
        .buffer_unordered(max_workers)
        .inspect(|outcome| {
            record_outcome(manager, outcome);
            main_pbar.println(describe_outcome(outcome));
            main_pbar.inc(1);
        })
        .collect::<Vec<_>>()
        .await;

    main_pbar.finish_and_clear();
    outcomes
}

fn record_outcome(manager: &DownloadManager, outcome: &RetrievalOutcome) {
    let result = &outcome.result;
    match result.status {
        DownloadStatus::Success => manager.record_success(),
        DownloadStatus::Skipped => manager.record_skip(
            &result.filename,
            result.message.as_deref().unwrap_or("文件已存在"),
        ),
        status => manager.record_failure(&result.filename, status),
    }
}

fn describe_outcome(outcome: &RetrievalOutcome) -> String {
    let result = &outcome.result;
    let name = utils::truncate_text(&result.filename, constants::FILENAME_TRUNCATE_LENGTH);
    let (symbol, color_fn, default_msg) = result.status.get_display_info();
    match (result.status, outcome.task.video.digest.as_deref()) {
        (DownloadStatus::Success, Some(digest)) => {
            format!("{} {} {}", symbol, name, format!("sha256:{}", digest.get(..12).unwrap_or(digest)).dimmed())
        }
        (DownloadStatus::Skipped, _) => format!("{} {}", *symbols::SKIP, name.dimmed()),
        (_, _) => match &result.message {
            Some(detail) => format!(
                "{} {} {}",
                symbol,
                name,
                color_fn(format!("失败: {} (详情: {})", default_msg, detail).into())
            ),
            None => format!("{} {}", symbol, name),
        },
    }
}

fn setup_progress_bar(multi: &MultiProgress, total: u64) -> ProgressBar {
    let style = ProgressStyle::with_template("{prefix:.bold} [{bar:30.green/white}] {pos}/{len} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    let pbar = multi.add(ProgressBar::new(total));
    pbar.set_style(style);
    pbar.set_prefix("总进度");
    pbar
}
