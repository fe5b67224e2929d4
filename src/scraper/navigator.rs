// src/scraper/navigator.rs

use super::{
    lecture_row::{parse_date, parse_quality_label, parse_source_label, parse_time_range},
    network_log::NetworkLogCorrelator,
};
use crate::{
    browser::{BrowserSession, ElementRef, Lookup},
    config::AppConfig,
    error::AppResult,
    models::{LectureInfo, Variant, Video},
};
use log::{debug, trace, warn};
use std::time::Duration;

/// 单个课时行的界面状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Idle,
    MenuOpen,
    DownloadRequested,
    DialogOpen,
    VariantEnumerated,
    Closed,
    Skipped,
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct CapturedLecture {
    pub info: LectureInfo,
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone)]
pub enum RowOutcome {
    /// 正常走完整个流程 (状态 `Closed`)。
    Captured(CapturedLecture),
    /// 没有视频菜单或行文本无法解析，属于预期情况。
    Skipped { reason: String },
    /// 流程中途某一步超时或出错，已枚举的视频全部丢弃。
    Abandoned { at: NavState, reason: String },
}

/// 驱动一个课时行的下载菜单：打开菜单 → 请求原始文件 → 读取变体对话框 → 触发下载 → 关闭对话框。
///
/// 每个课时行使用一个新的实例，所有界面操作按顺序等待完成。
pub struct DownloadMenuNavigator<'a> {
    session: &'a dyn BrowserSession,
    config: &'a AppConfig,
    row: ElementRef,
    state: NavState,
    menu: Option<ElementRef>,
    dialog: Option<ElementRef>,
    videos: Vec<Video>,
}

impl<'a> DownloadMenuNavigator<'a> {
    pub fn new(session: &'a dyn BrowserSession, config: &'a AppConfig, row: ElementRef) -> Self {
        Self {
            session,
            config,
            row,
            state: NavState::Idle,
            menu: None,
            dialog: None,
            videos: Vec::new(),
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// 只有非本行范围的错误 (例如数据归属冲突) 才会以 `Err` 返回。
    pub async fn run(&mut self) -> AppResult<RowOutcome> {
        let info = match self.read_row_info().await {
            Ok(info) => info,
            Err(e) if e.is_row_local() => return Ok(self.skip(format!("课时信息无法解析: {}", e))),
            Err(e) => return Err(e),
        };
        trace!("课时行 {:?}: {} {}", self.row, info.date, info.title);

        let menu_wait = self.config.timeouts.menu;
        let menu_button = match self
            .session
            .find_one(&self.config.selectors.menu_button, Some(self.row), menu_wait)
            .await
        {
            Ok(Lookup::Found(button)) => button,
            Ok(Lookup::NotFound) => {
                return Ok(self.skip(format!("'{}' 没有视频菜单 (无录像)", info.title)));
            }
            Err(e) if e.is_row_local() => return Ok(self.skip(e.to_string())),
            Err(e) => return Err(e),
        };

        match self.capture(menu_button).await {
            Ok(()) => {
                self.transition(NavState::Closed);
                Ok(RowOutcome::Captured(CapturedLecture {
                    info,
                    videos: std::mem::take(&mut self.videos),
                }))
            }
            Err(e) if e.is_row_local() => {
                let at = self.state;
                warn!("课时 '{}' 在状态 {:?} 处中断: {}", info.title, at, e);
                self.close_quietly().await;
                self.videos.clear();
                self.transition(NavState::Abandoned);
                Ok(RowOutcome::Abandoned {
                    at,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn read_row_info(&self) -> AppResult<LectureInfo> {
        let selectors = &self.config.selectors;
        let title = self.text_in(&selectors.lecture_title, self.row).await?;
        let date = parse_date(&self.text_in(&selectors.lecture_date, self.row).await?)?;
        let (start_time, end_time) =
            parse_time_range(&self.text_in(&selectors.lecture_time, self.row).await?)?;
        Ok(LectureInfo {
            title: title.trim().to_string(),
            date,
            start_time,
            end_time,
        })
    }

    async fn capture(&mut self, menu_button: ElementRef) -> AppResult<()> {
        let session = self.session;
        let selectors = &self.config.selectors;
        let timeouts = self.config.timeouts;

        session.click(menu_button).await?;
        self.menu = Some(menu_button);
        self.transition(NavState::MenuOpen);

        let action = self
            .require(&selectors.download_original, None, timeouts.dialog)
            .await?;
        session.click(action).await?;
        self.menu = None;
        self.transition(NavState::DownloadRequested);

        let dialog = self
            .require(&selectors.download_dialog, None, timeouts.dialog)
            .await?;
        self.dialog = Some(dialog);
        self.transition(NavState::DialogOpen);

        self.enumerate_variants(dialog).await?;
        self.transition(NavState::VariantEnumerated);

        let close = self
            .require(&selectors.dialog_close, Some(dialog), timeouts.dialog)
            .await?;
        session.click(close).await?;
        self.dialog = None;
        Ok(())
    }

    async fn enumerate_variants(&mut self, dialog: ElementRef) -> AppResult<()> {
        let session = self.session;
        let config = self.config;
        let selectors = &config.selectors;
        let timeouts = config.timeouts;

        let source_rows = session
            .find_all(&selectors.source_row, Some(dialog), timeouts.dialog)
            .await?;
        for source_row in source_rows {
            let source = parse_source_label(
                &self.text_in(&selectors.source_label, source_row).await?,
            )?;
            let options = session
                .find_all(&selectors.quality_option, Some(source_row), timeouts.dialog)
                .await?;

            for option in options {
                let (quality, size) = parse_quality_label(&session.text(option).await?)?;
                let variant = Variant::new(source, quality);
                if self.videos.iter().any(|v| v.variant == variant) {
                    warn!("对话框中出现重复的视频变体 {}，忽略", variant);
                    continue;
                }

                let mut video = Video::new(variant, size);
                if config.target_variants.contains(&variant) {
                    video.url = match self.resolve_variant(option).await {
                        Ok(Some(url)) => {
                            debug!("视频变体 {} 的下载地址: {}", variant, url);
                            Some(url)
                        }
                        Ok(None) => {
                            warn!("未能从网络日志中解析视频变体 {} 的下载地址", variant);
                            None
                        }
                        Err(e) if e.is_row_local() => {
                            warn!("触发视频变体 {} 的下载失败: {}", variant, e);
                            None
                        }
                        Err(e) => return Err(e),
                    };
                }
                self.videos.push(video);
            }
        }
        Ok(())
    }

    /// 点击某个选项的下载按钮，并从网络日志中找出它发出的视频请求。
    async fn resolve_variant(&self, option: ElementRef) -> AppResult<Option<String>> {
        let config = self.config;
        let trigger = self
            .require(&config.selectors.quality_trigger, Some(option), config.timeouts.field)
            .await?;
        NetworkLogCorrelator::new(
            self.session,
            &config.content_host_prefix,
            config.timeouts.log_wait,
            config.timeouts.log_poll,
        )
        .resolve(self.session.click(trigger))
        .await
    }

    /// 中途放弃时尽量关掉已打开的对话框或菜单，保证下一行从干净的页面开始。
    async fn close_quietly(&mut self) {
        if let Some(menu) = self.menu.take() {
            // 菜单按钮再点一次即收起
            if let Err(e) = self.session.click(menu).await {
                debug!("收起视频菜单失败: {}", e);
            }
        }
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        let selector = &self.config.selectors.dialog_close;
        if let Ok(Lookup::Found(close)) = self
            .session
            .find_one(selector, Some(dialog), self.config.timeouts.field)
            .await
        {
            if let Err(e) = self.session.click(close).await {
                debug!("关闭下载对话框失败: {}", e);
            }
        }
    }

    async fn require(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
        wait: Duration,
    ) -> AppResult<ElementRef> {
        self.session
            .find_one(selector, scope, wait)
            .await?
            .or_not_found(selector, wait)
    }

    async fn text_in(&self, selector: &str, scope: ElementRef) -> AppResult<String> {
        let element = self.require(selector, Some(scope), self.config.timeouts.field).await?;
        self.session.text(element).await
    }

    fn skip(&mut self, reason: String) -> RowOutcome {
        self.transition(NavState::Skipped);
        RowOutcome::Skipped { reason }
    }

    fn transition(&mut self, next: NavState) {
        trace!("课时行 {:?}: {:?} -> {:?}", self.row, self.state, next);
        self.state = next;
    }
}
