// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{
    cli::Cli,
    constants,
    error::{AppError, AppResult},
    models::Variant,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, path::PathBuf, time::Duration};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            // 两次读到数据之间的最长间隔，不限制整个下载的耗时
            read_timeout_secs: 60,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub courses_path: String,
    pub login_path: String,
    pub content_host_prefix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: constants::site::BASE_URL.into(),
            courses_path: constants::site::COURSES_PATH.into(),
            login_path: constants::site::LOGIN_PATH.into(),
            content_host_prefix: constants::site::CONTENT_HOST_PREFIX.into(),
        }
    }
}

/// 页面上用到的全部 CSS 选择器。页面改版时只需修改配置文件。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub course_card: String,
    pub course_link: String,
    pub course_lecture_count: String,
    pub course_term: String,
    pub course_year: String,
    pub course_info: String,
    pub title_attribute: String,
    pub lecture_row: String,
    pub lecture_title: String,
    pub lecture_date: String,
    pub lecture_time: String,
    pub menu_button: String,
    pub download_original: String,
    pub download_dialog: String,
    pub source_row: String,
    pub source_label: String,
    pub quality_option: String,
    pub quality_trigger: String,
    pub dialog_close: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            course_card: r#"div[role="row"] > span[role="gridcell"]"#.into(),
            course_link: "a".into(),
            course_lecture_count: "span.SectionCard__LessonCount-sc-757pmy-1".into(),
            course_term: "div.SectionCard__TermAndDate-sc-757pmy-2".into(),
            course_year: "span.commonComponents__CardName-sc-1pafgjx-18".into(),
            course_info: "span.SectionCard__CourseInfo-sc-757pmy-3".into(),
            title_attribute: "title".into(),
            lecture_row: "div.class-row".into(),
            lecture_title: "span.header".into(),
            lecture_date: "span.date".into(),
            lecture_time: "span.time".into(),
            menu_button: r#"button[aria-label="Video Menu"]"#.into(),
            download_original: r#"a[data-test-name="download-original"]"#.into(),
            download_dialog: "div.downloadModal".into(),
            source_row: "div.source-row".into(),
            source_label: "span.source-label".into(),
            quality_option: "div.quality-option".into(),
            quality_trigger: "a.download-link".into(),
            dialog_close: "button.close".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub catalog_wait_secs: u64,
    pub field_wait_ms: u64,
    pub menu_wait_ms: u64,
    pub dialog_wait_secs: u64,
    pub log_wait_ms: u64,
    pub log_poll_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            catalog_wait_secs: 10,
            field_wait_ms: 1000,
            menu_wait_ms: 2000,
            dialog_wait_secs: 5,
            log_wait_ms: 5000,
            log_poll_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// 浏览器端各类等待的超时时间。
#[derive(Debug, Clone, Copy)]
pub struct WaitTimeouts {
    pub catalog: Duration,
    pub field: Duration,
    pub menu: Duration,
    pub dialog: Duration,
    pub log_wait: Duration,
    pub log_poll: Duration,
}

impl From<&TimeoutConfig> for WaitTimeouts {
    fn from(t: &TimeoutConfig) -> Self {
        Self {
            catalog: Duration::from_secs(t.catalog_wait_secs),
            field: Duration::from_millis(t.field_wait_ms),
            menu: Duration::from_millis(t.menu_wait_ms),
            dialog: Duration::from_secs(t.dialog_wait_secs),
            log_wait: Duration::from_millis(t.log_wait_ms),
            log_poll: Duration::from_millis(t.log_poll_ms.max(1)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_workers: usize,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_retries: u32,
    pub base_url: Url,
    pub courses_url: Url,
    pub login_url: Url,
    pub content_host_prefix: String,
    pub target_course_codes: BTreeSet<String>,
    pub target_variants: BTreeSet<Variant>,
    pub download_dir: PathBuf,
    pub video_extension: String,
    pub force_redownload: bool,
    pub selectors: SelectorConfig,
    pub timeouts: WaitTimeouts,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        Self::from_parts(external_config, args)
    }

    /// 合并配置文件与命令行参数，命令行优先。
    pub fn from_parts(external: ExternalConfig, args: &Cli) -> AppResult<Self> {
        let base_url = Url::parse(&external.site.base_url)?;
        let courses_url = base_url.join(&external.site.courses_path)?;
        let login_url = base_url.join(&external.site.login_path)?;

        let content_host_prefix = args
            .content_host
            .clone()
            .unwrap_or(external.site.content_host_prefix);
        if content_host_prefix.trim().is_empty() {
            return Err(AppError::UserInputError("内容服务器地址不能为空".to_string()));
        }

        let target_course_codes = args
            .courses
            .iter()
            .flat_map(|s| s.split(','))
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        let mut target_variants: BTreeSet<Variant> = args.variants.iter().copied().collect();
        if target_variants.is_empty() {
            target_variants.insert(
                constants::DEFAULT_VARIANT
                    .parse()
                    .map_err(AppError::UserInputError)?,
            );
        }

        let max_workers = args.workers.unwrap_or(constants::DEFAULT_WORKERS).max(1);

        Ok(Self {
            max_workers,
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(external.network.connect_timeout_secs),
            read_timeout: Duration::from_secs(external.network.read_timeout_secs),
            max_retries: external.network.max_retries,
            base_url,
            courses_url,
            login_url,
            content_host_prefix,
            target_course_codes,
            target_variants,
            download_dir: args.output.clone(),
            video_extension: constants::DEFAULT_VIDEO_EXTENSION.into(),
            force_redownload: args.force_redownload,
            selectors: external.selectors,
            timeouts: WaitTimeouts::from(&external.timeouts),
        })
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        let base_url = Url::parse(constants::site::BASE_URL).expect("默认站点地址无效");
        Self {
            max_workers: 2,
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(15),
            max_retries: 0,
            courses_url: base_url.join(constants::site::COURSES_PATH).expect("课程地址无效"),
            login_url: base_url.join(constants::site::LOGIN_PATH).expect("登录地址无效"),
            base_url,
            content_host_prefix: constants::site::CONTENT_HOST_PREFIX.to_string(),
            target_course_codes: BTreeSet::new(),
            target_variants: BTreeSet::from([constants::DEFAULT_VARIANT
                .parse()
                .expect("默认视频变体无效")]),
            download_dir: PathBuf::from(constants::DEFAULT_SAVE_DIR),
            video_extension: constants::DEFAULT_VIDEO_EXTENSION.to_string(),
            force_redownload: false,
            selectors: SelectorConfig::default(),
            timeouts: WaitTimeouts {
                catalog: Duration::from_millis(50),
                field: Duration::from_millis(10),
                menu: Duration::from_millis(20),
                dialog: Duration::from_millis(20),
                log_wait: Duration::from_millis(30),
                log_poll: Duration::from_millis(5),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_overrides_external_config() {
        let args = Cli::parse_from([
            "echo-dl",
            "-c",
            "comp6843,COMP9417",
            "-c",
            "MATH1131",
            "--variant",
            "2:SD",
            "--content-host",
            "cdn.example.org",
            "-w",
            "0",
        ]);
        let config = AppConfig::from_parts(ExternalConfig::default(), &args).unwrap();
        assert_eq!(
            config.target_course_codes,
            BTreeSet::from(["COMP6843".into(), "COMP9417".into(), "MATH1131".into()])
        );
        assert_eq!(config.target_variants.len(), 1);
        assert_eq!(config.target_variants.iter().next().unwrap().to_string(), "2:SD");
        assert_eq!(config.content_host_prefix, "cdn.example.org");
        assert_eq!(config.max_workers, 1);
        assert_eq!(config.courses_url.as_str(), "https://echo360.net.au/courses");
    }

    #[test]
    fn test_defaults_without_overrides() {
        let args = Cli::parse_from(["echo-dl"]);
        let config = AppConfig::from_parts(ExternalConfig::default(), &args).unwrap();
        assert!(config.target_course_codes.is_empty());
        assert_eq!(config.target_variants.iter().next().unwrap().to_string(), "1:HD");
        assert_eq!(config.content_host_prefix, constants::site::CONTENT_HOST_PREFIX);
        assert_eq!(config.timeouts.menu, Duration::from_secs(2));
        assert_eq!(config.timeouts.catalog, Duration::from_secs(10));
    }

    #[test]
    fn test_partial_external_config_uses_defaults() {
        let external: ExternalConfig =
            serde_json::from_str(r#"{"timeouts": {"menu_wait_ms": 500}}"#).unwrap();
        assert_eq!(external.timeouts.menu_wait_ms, 500);
        assert_eq!(external.timeouts.catalog_wait_secs, 10);
        assert_eq!(external.selectors.dialog_close, "button.close");
    }
}
