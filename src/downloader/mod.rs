// src/downloader/mod.rs

mod retriever;
mod task_runner;

pub use retriever::{RetrievalOutcome, VideoRetriever};
pub use task_runner::execute_tasks;

use crate::{models::DownloadStatus, symbols, ui};
use colored::*;
use itertools::Itertools;
use log::info;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// 一条被跳过或失败的记录：(文件名, 原因)。
type ReportEntry = (String, String);

/// 汇总一批视频下载的统计与失败原因，在并发任务之间共享。
#[derive(Clone, Default)]
pub struct DownloadManager {
    stats: Arc<Mutex<DownloadStats>>,
    failed: Arc<Mutex<Vec<ReportEntry>>>,
    skipped: Arc<Mutex<Vec<ReportEntry>>>,
}

impl DownloadManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_batch(&self, total: usize) {
        info!("开始新一批视频下载，总数: {}", total);
        *self.stats.lock().unwrap() = DownloadStats {
            total,
            ..Default::default()
        };
        self.failed.lock().unwrap().clear();
        self.skipped.lock().unwrap().clear();
    }

    pub fn record_success(&self) {
        self.stats.lock().unwrap().success += 1;
    }

    pub fn record_skip(&self, filename: &str, reason: &str) {
        info!("跳过视频 '{}'，原因: {}", filename, reason);
        self.stats.lock().unwrap().skipped += 1;
        self.skipped
            .lock()
            .unwrap()
            .push((filename.to_string(), reason.to_string()));
    }

    pub fn record_failure(&self, filename: &str, status: DownloadStatus) {
        log::error!("视频 '{}' 下载失败，状态: {:?}", filename, status);
        self.stats.lock().unwrap().failed += 1;
        let (_, _, reason) = status.get_display_info();
        self.failed
            .lock()
            .unwrap()
            .push((filename.to_string(), reason.to_string()));
    }

    pub fn get_stats(&self) -> DownloadStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn print_report(&self) {
        let stats = self.get_stats();
        info!(
            "下载报告: Total={}, Success={}, Skipped={}, Failed={}",
            stats.total, stats.success, stats.skipped, stats.failed
        );
        let skipped = self.skipped.lock().unwrap().clone();
        let failed = self.failed.lock().unwrap().clone();

        if !skipped.is_empty() || !failed.is_empty() {
            ui::print_sub_header("下载详情");
            if !skipped.is_empty() {
                println!("\n{} 已存在的视频 ({}个):", *symbols::INFO, stats.skipped);
                print_grouped(skipped, |s| s.cyan());
            }
            if !failed.is_empty() {
                println!("\n{} 失败的视频 ({}个):", *symbols::ERROR, stats.failed);
                print_grouped(failed, |s| s.red());
            }
        }

        ui::print_sub_header("任务总结");
        if stats.failed == 0 {
            println!(
                "{} 所有 {} 个视频均已就绪 ({} 个已存在)。",
                *symbols::OK,
                stats.total,
                stats.skipped
            );
        } else {
            println!(
                "{} | {} | {}",
                format!("成功: {}", stats.success).green(),
                format!("失败: {}", stats.failed).red(),
                format!("跳过: {}", stats.skipped).yellow()
            );
        }
    }
}

/// 按原因分组打印，原因和文件名都按字母序排列。
fn print_grouped(items: Vec<ReportEntry>, color_fn: fn(ColoredString) -> ColoredString) {
    let grouped = items
        .into_iter()
        .map(|(filename, reason)| (reason, filename))
        .into_group_map();
    for (reason, filenames) in grouped.into_iter().sorted() {
        println!("  - {}", color_fn(format!("原因: {}", reason).into()));
        for filename in filenames.into_iter().sorted() {
            println!("    - {}", filename);
        }
    }
}
