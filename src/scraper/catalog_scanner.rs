// src/scraper/catalog_scanner.rs

use super::course_codes;
use crate::{
    browser::{BrowserSession, ElementRef},
    config::AppConfig,
    error::{AppError, AppResult},
    models::Course,
    utils,
};
use log::{debug, info, warn};

/// 读取课程列表页，为每张课程卡片生成一个 [`Course`]。
pub struct CatalogScanner<'a> {
    session: &'a dyn BrowserSession,
    config: &'a AppConfig,
}

impl<'a> CatalogScanner<'a> {
    pub fn new(session: &'a dyn BrowserSession, config: &'a AppConfig) -> Self {
        Self { session, config }
    }

    /// 课程卡片容器在超时内未出现时返回 [`AppError::Scan`]，整个运行随之终止。
    pub async fn scan(&self) -> AppResult<Vec<Course>> {
        let selectors = &self.config.selectors;
        info!("读取课程列表: {}", self.config.courses_url);
        self.session
            .navigate(self.config.courses_url.as_str())
            .await
            .map_err(|e| AppError::Scan(e.to_string()))?;

        let cards = self
            .session
            .find_all(&selectors.course_card, None, self.config.timeouts.catalog)
            .await
            .map_err(|e| AppError::Scan(e.to_string()))?;
        debug!("找到 {} 张课程卡片", cards.len());

        let mut courses = Vec::with_capacity(cards.len());
        for (index, card) in cards.into_iter().enumerate() {
            match self.read_card(card).await {
                Ok(course) => {
                    debug!(
                        "课程卡片 #{}: {} - {} ({} 个课时)",
                        index + 1,
                        course.display_codes(),
                        course.course_name,
                        course.declared_lecture_count
                    );
                    courses.push(course);
                }
                Err(e) if e.is_row_local() => {
                    warn!("跳过课程卡片 #{}: {}", index + 1, e);
                }
                Err(e) => return Err(e),
            }
        }
        info!("课程列表读取完成，共 {} 门课程", courses.len());
        Ok(courses)
    }

    async fn read_card(&self, card: ElementRef) -> AppResult<Course> {
        let selectors = &self.config.selectors;

        let link = self.field(&selectors.course_link, card).await?;
        let href = self
            .session
            .attribute(link, "href")
            .await?
            .ok_or_else(|| AppError::Parse("课程链接缺少 href".to_string()))?;
        let url = self
            .config
            .base_url
            .join(href.trim())
            .map_err(|e| AppError::Parse(format!("无效的课程链接 '{}': {}", href, e)))?;

        let count_el = self.field(&selectors.course_lecture_count, card).await?;
        let count_text = self.session.text(count_el).await?;
        let declared_lecture_count = utils::first_integer(&count_text)
            .ok_or_else(|| AppError::Parse(format!("无法解析课时数量 '{}'", count_text)))?;

        let term_title = self.title_of(&selectors.course_term, card).await?;
        let term = term_title
            .trim()
            .chars()
            .last()
            .map(String::from)
            .ok_or_else(|| AppError::Parse("学期标题为空".to_string()))?;

        let year_title = self.title_of(&selectors.course_year, card).await?;
        let year: String = year_title.trim().chars().take(4).collect();
        if year.is_empty() {
            return Err(AppError::Parse("年份标题为空".to_string()));
        }

        let course_info = self.title_of(&selectors.course_info, card).await?;
        let (codes_str, course_name) = course_info.trim().split_once(" - ").ok_or_else(|| {
            AppError::Parse(format!("课程信息中没有 ' - ' 分隔符: '{}'", course_info))
        })?;

        Course::new(
            course_codes::expand(codes_str),
            course_name.trim().to_string(),
            year,
            term,
            declared_lecture_count,
            url.to_string(),
        )
    }

    async fn field(&self, selector: &str, card: ElementRef) -> AppResult<ElementRef> {
        let wait = self.config.timeouts.field;
        self.session
            .find_one(selector, Some(card), wait)
            .await?
            .or_not_found(selector, wait)
    }

    async fn title_of(&self, selector: &str, card: ElementRef) -> AppResult<String> {
        let element = self.field(selector, card).await?;
        self.session
            .attribute(element, &self.config.selectors.title_attribute)
            .await?
            .ok_or_else(|| AppError::Parse(format!("元素 '{}' 缺少标题属性", selector)))
    }
}
