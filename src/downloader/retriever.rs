// src/downloader/retriever.rs

use crate::{
    client::RobustClient,
    constants,
    error::*,
    models::{DownloadAction, DownloadResult, DownloadStatus, RetrievalTask, Video},
    ui, utils,
};
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar};
use log::{debug, error, info};
use reqwest::Response;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

/// 单个视频的处理结果：更新后的视频记录以及用于报告的下载结果。
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub task: RetrievalTask,
    pub result: DownloadResult,
}

/// 把已解析出地址的视频流式写入本地文件，并计算 SHA-256 摘要。
pub struct VideoRetriever {
    client: Arc<RobustClient>,
    force_redownload: bool,
}

impl VideoRetriever {
    pub fn new(client: Arc<RobustClient>, force_redownload: bool) -> Self {
        Self {
            client,
            force_redownload,
        }
    }

    /// 处理一个下载任务。失败不会向上传播，而是记录在返回的 [`DownloadResult`] 中，
    /// 此时任务里的视频记录保持原样 (没有文件路径和摘要)。
    pub async fn process(&self, task: RetrievalTask, multi: &MultiProgress) -> RetrievalOutcome {
        let filename = task
            .filepath
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| task.filepath.display().to_string());

        let attempt: AppResult<(Video, DownloadStatus, Option<String>)> = async {
            let (action, reason) = self.prepare_action(&task.filepath);
            match action {
                DownloadAction::Skip => {
                    let video = Self::adopt_existing(task.video.clone(), &task.filepath).await?;
                    Ok((video, DownloadStatus::Skipped, Some(reason)))
                }
                DownloadAction::DownloadNew => {
                    debug!("下载 '{}': {}", filename, reason);
                    let video = self
                        .retrieve(task.video.clone(), &task.filepath, multi)
                        .await?;
                    Ok((video, DownloadStatus::Success, None))
                }
            }
        }
        .await;

        match attempt {
            Ok((video, status, message)) => RetrievalOutcome {
                task: RetrievalTask { video, ..task },
                result: DownloadResult {
                    filename,
                    status,
                    message,
                },
            },
            Err(e) => {
                error!("下载任务 '{}' 失败: {}", task.filepath.display(), e);
                RetrievalOutcome {
                    task,
                    result: DownloadResult {
                        filename,
                        status: DownloadStatus::from(&e),
                        message: Some(e.to_string()),
                    },
                }
            }
        }
    }

    fn prepare_action(&self, filepath: &Path) -> (DownloadAction, String) {
        if !filepath.exists() {
            return (DownloadAction::DownloadNew, "文件不存在".to_string());
        }
        if self.force_redownload {
            info!("用户强制重新下载文件: {:?}", filepath);
            return (DownloadAction::DownloadNew, "强制重新下载".to_string());
        }
        (DownloadAction::Skip, "文件已存在".to_string())
    }

    /// 下载视频到 `filepath`，成功后返回带有文件路径和摘要的视频记录。
    ///
    /// 数据先写入同目录下的临时文件，完整写完后才改名为目标文件，
    /// 因此中途失败不会留下半截文件。
    pub async fn retrieve(
        &self,
        mut video: Video,
        filepath: &Path,
        multi: &MultiProgress,
    ) -> AppResult<Video> {
        let url = video
            .url
            .clone()
            .ok_or_else(|| AppError::Retrieval(format!("视频 {} 没有下载地址", video.variant)))?;
        let dir = match filepath.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let res = self.client.get(url.as_str()).await.map_err(|e| match e {
            AppError::Network(err) if err.is_status() => AppError::Retrieval(format!(
                "服务器返回 {}",
                err.status().map(|s| s.to_string()).unwrap_or_default()
            )),
            other => other,
        })?;
        let prefix = utils::truncate_text(
            &filepath
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            constants::FILENAME_TRUNCATE_LENGTH / 2,
        );
        let pbar = match res.content_length() {
            Some(total) if total > 0 => ui::new_bytes_progress_bar(multi, total, &prefix),
            _ => ui::new_spinner(multi, &prefix),
        };

        let written = Self::stream_to_file(res, &dir, filepath, &pbar).await;
        pbar.finish_and_clear();
        multi.remove(&pbar);
        let bytes = written?;
        debug!("'{}' 写入 {} 字节", filepath.display(), bytes);

        let digest = digest_of(filepath.to_path_buf()).await?;
        video.file_path = Some(filepath.to_path_buf());
        video.digest = Some(digest);
        Ok(video)
    }

    async fn stream_to_file(
        res: Response,
        dir: &Path,
        filepath: &Path,
        pbar: &ProgressBar,
    ) -> AppResult<u64> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".echo-dl-")
            .suffix(".part")
            .tempfile_in(dir)?;

        let mut written = 0u64;
        {
            let mut writer = BufWriter::with_capacity(constants::DOWNLOAD_CHUNK_SIZE, tmp.as_file_mut());
            let mut stream = res.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| AppError::Retrieval(format!("数据流中断: {}", e)))?;
                writer.write_all(&chunk)?;
                written += chunk.len() as u64;
                pbar.inc(chunk.len() as u64);
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(filepath)?;
        Ok(written)
    }

    /// 已存在的文件不重新下载，但仍计算摘要，使视频记录完整。
    async fn adopt_existing(mut video: Video, filepath: &Path) -> AppResult<Video> {
        let digest = digest_of(filepath.to_path_buf()).await?;
        video.file_path = Some(filepath.to_path_buf());
        video.digest = Some(digest);
        Ok(video)
    }
}

async fn digest_of(path: PathBuf) -> AppResult<String> {
    tokio::task::spawn_blocking(move || utils::calculate_file_sha256(&path))
        .await
        .map_err(|e| AppError::Other(anyhow::Error::new(e)))?
}
