// src/scraper/mod.rs

pub mod catalog_scanner;
pub mod course_codes;
pub mod lecture_row;
pub mod navigator;
pub mod network_log;

pub use catalog_scanner::CatalogScanner;
pub use navigator::{CapturedLecture, DownloadMenuNavigator, NavState, RowOutcome};
pub use network_log::NetworkLogCorrelator;

use crate::{
    browser::{BrowserSession, ElementRef},
    config::AppConfig,
    error::AppResult,
    models::{CourseCatalog, CourseId},
    ui,
};
use log::{debug, info, warn};

/// 一次抓取中各类课时行的数量。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub captured: usize,
    pub skipped: usize,
    pub abandoned: usize,
    pub resolved_videos: usize,
}

impl ScrapeSummary {
    fn merge(&mut self, other: ScrapeSummary) {
        self.captured += other.captured;
        self.skipped += other.skipped;
        self.abandoned += other.abandoned;
        self.resolved_videos += other.resolved_videos;
    }
}

/// 把课程列表和各课程页面的抓取结果写入 [`CourseCatalog`]。
pub struct CourseScraper<'a> {
    session: &'a dyn BrowserSession,
    config: &'a AppConfig,
}

impl<'a> CourseScraper<'a> {
    pub fn new(session: &'a dyn BrowserSession, config: &'a AppConfig) -> Self {
        Self { session, config }
    }

    pub async fn build_catalog(&self) -> AppResult<CourseCatalog> {
        let courses = CatalogScanner::new(self.session, self.config).scan().await?;
        let mut catalog = CourseCatalog::new();
        for course in courses {
            catalog.add_course(course)?;
        }
        Ok(catalog)
    }

    /// 依次抓取所有目标课程。课程过滤为空时抓取全部课程。
    pub async fn scrape_targets(&self, catalog: &mut CourseCatalog) -> AppResult<ScrapeSummary> {
        let targets: Vec<CourseId> = catalog
            .courses()
            .filter(|(_, c)| c.is_targeted(&self.config.target_course_codes))
            .map(|(id, _)| id)
            .collect();
        if targets.is_empty() {
            warn!("没有课程匹配过滤条件 {:?}", self.config.target_course_codes);
            ui::warn("没有找到匹配的课程。");
        }

        let mut total = ScrapeSummary::default();
        for course_id in targets {
            total.merge(self.scrape_course(catalog, course_id).await?);
        }
        Ok(total)
    }

    /// 抓取单个课程的全部课时行并提交到目录。
    ///
    /// 课程页面打不开或课时行容器缺失只跳过这门课程；归属冲突等目录错误会直接返回。
    pub async fn scrape_course(
        &self,
        catalog: &mut CourseCatalog,
        course_id: CourseId,
    ) -> AppResult<ScrapeSummary> {
        let course = catalog.course(course_id)?;
        let label = format!("{} {}", course.display_codes(), course.course_name);
        let url = course.url.clone();
        ui::print_sub_header(&label);
        info!("抓取课程 {}: {}", label, url);

        let mut summary = ScrapeSummary::default();
        let rows = match self.open_lecture_list(&url).await {
            Ok(rows) => rows,
            Err(e) if e.is_row_local() => {
                warn!("课程 {} 的课时列表无法打开: {}", label, e);
                ui::warn(&format!("课程 {} 没有找到课时列表，跳过。", label));
                return Ok(summary);
            }
            Err(e) => return Err(e),
        };
        debug!("课程 {} 共有 {} 个课时行", label, rows.len());

        for row in rows {
            let outcome = DownloadMenuNavigator::new(self.session, self.config, row)
                .run()
                .await?;
            match outcome {
                RowOutcome::Captured(captured) => {
                    let title = captured.info.title.clone();
                    let pending = catalog.draft_lecture(course_id, captured.info)?;
                    let lecture_id = catalog.append_lecture(course_id, pending)?;
                    let mut resolved = 0;
                    for video in captured.videos {
                        if video.is_resolved() {
                            resolved += 1;
                        }
                        catalog.attach_video(lecture_id, video)?;
                    }
                    let lecture_num = catalog.lecture(lecture_id)?.lecture_num();
                    ui::plain(&format!(
                        "  Lecture {:>2}: {} ({} 个可下载视频)",
                        lecture_num, title, resolved
                    ));
                    summary.captured += 1;
                    summary.resolved_videos += resolved;
                }
                RowOutcome::Skipped { reason } => {
                    ui::skip(&reason);
                    summary.skipped += 1;
                }
                RowOutcome::Abandoned { at, reason } => {
                    ui::warn(&format!("课时中断 ({:?}): {}", at, reason));
                    summary.abandoned += 1;
                }
            }
        }
        info!("课程 {} 抓取完成: {:?}", label, summary);
        Ok(summary)
    }

    async fn open_lecture_list(&self, url: &str) -> AppResult<Vec<ElementRef>> {
        self.session.navigate(url).await?;
        self.session
            .find_all(
                &self.config.selectors.lecture_row,
                None,
                self.config.timeouts.catalog,
            )
            .await
    }
}
