// src/browser/chrome.rs

use super::{BrowserSession, ElementRef, Lookup, RawLogEntry};
use crate::{
    constants::network_log::REQUEST_WILL_BE_SENT,
    error::{AppError, AppResult},
};
use async_trait::async_trait;
use chromiumoxide::{
    Element, Page,
    browser::{Browser, BrowserConfig},
    cdp::browser_protocol::network::{EnableParams, EventRequestWillBeSent},
};
use futures::StreamExt;
use log::{debug, info, trace, warn};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{sync::Mutex as TokioMutex, task::JoinHandle, time::Instant};
use url::Url;

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(200);
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default)]
pub struct ChromeOptions {
    pub headless: bool,
    pub profile_dir: Option<PathBuf>,
}

/// 基于 CDP 的 Chrome 会话。
///
/// 元素句柄保存在会话内部的列表中，[`ElementRef`] 是列表下标；每次跳转页面后清空。
/// 网络日志由后台任务从 `Network.requestWillBeSent` 事件中收集。
pub struct ChromeSession {
    browser: TokioMutex<Browser>,
    page: Page,
    elements: TokioMutex<Vec<Element>>,
    network_log: Arc<Mutex<Vec<RawLogEntry>>>,
    handler_task: JoinHandle<()>,
    log_task: JoinHandle<()>,
}

impl ChromeSession {
    pub async fn launch(options: &ChromeOptions) -> AppResult<Self> {
        let mut builder = BrowserConfig::builder();
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &options.profile_dir {
            builder = builder.user_data_dir(dir);
        }
        let config = builder
            .build()
            .map_err(|e| AppError::Browser(format!("浏览器配置失败: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });
        info!("浏览器已启动 (headless: {})", options.headless);

        let page = browser.new_page("about:blank").await?;
        page.execute(EnableParams::default()).await?;

        let network_log = Arc::new(Mutex::new(Vec::new()));
        let sink = network_log.clone();
        let mut events = page.event_listener::<EventRequestWillBeSent>().await?;
        let log_task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let entry = serde_json::json!({
                    "message": {
                        "method": REQUEST_WILL_BE_SENT,
                        "params": { "request": { "url": event.request.url.clone() } }
                    }
                });
                if let Ok(mut log) = sink.lock() {
                    log.push(RawLogEntry::new(entry.to_string()));
                }
            }
        });

        Ok(Self {
            browser: TokioMutex::new(browser),
            page,
            elements: TokioMutex::new(Vec::new()),
            network_log,
            handler_task,
            log_task,
        })
    }

    /// 打开登录页并等待用户手动登录，直到页面跳转到 `landing_url` 之下。
    pub async fn wait_for_login(
        &self,
        login_url: &Url,
        landing_url: &Url,
        timeout: Duration,
    ) -> AppResult<()> {
        self.navigate(login_url.as_str()).await?;
        let deadline = Instant::now() + timeout;
        loop {
            let current = self.page.url().await?.unwrap_or_default();
            trace!("当前页面: {}", current);
            if current.starts_with(landing_url.as_str()) {
                info!("检测到已登录: {}", current);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::Browser(format!(
                    "等待登录超时 ({} 秒)",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(LOGIN_POLL_INTERVAL).await;
        }
    }

    pub async fn shutdown(self) {
        self.log_task.abort();
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        let _ = browser.wait().await;
        self.handler_task.abort();
    }

    /// 在 `timeout` 内轮询查找元素，找到后登记句柄并返回。超时返回空列表。
    async fn poll_elements(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
        timeout: Duration,
        limit: Option<usize>,
    ) -> AppResult<Vec<ElementRef>> {
        let deadline = Instant::now() + timeout;
        loop {
            let mut elements = self.elements.lock().await;
            let found = match scope {
                Some(parent) => {
                    let parent = elements.get(parent.0).ok_or_else(|| {
                        AppError::Browser(format!("无效的元素句柄 {:?}", parent))
                    })?;
                    parent.find_elements(selector).await?
                }
                None => self.page.find_elements(selector).await?,
            };
            if !found.is_empty() {
                let take = limit.unwrap_or(found.len());
                let start = elements.len();
                elements.extend(found.into_iter().take(take));
                let refs: Vec<ElementRef> = (start..elements.len()).map(ElementRef).collect();
                trace!("选择器 '{}' 匹配到 {} 个元素", selector, refs.len());
                return Ok(refs);
            }
            drop(elements);
            if Instant::now() >= deadline {
                debug!("选择器 '{}' 在 {:?} 内未匹配到元素", selector, timeout);
                return Ok(Vec::new());
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        debug!("跳转页面: {}", url);
        self.elements.lock().await.clear();
        self.page.goto(url).await?;
        Ok(())
    }

    async fn find_all(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
        timeout: Duration,
    ) -> AppResult<Vec<ElementRef>> {
        let refs = self.poll_elements(selector, scope, timeout, None).await?;
        if refs.is_empty() {
            return Err(AppError::NotFound {
                selector: selector.to_string(),
                waited_ms: timeout.as_millis(),
            });
        }
        Ok(refs)
    }

    async fn find_one(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
        timeout: Duration,
    ) -> AppResult<Lookup<ElementRef>> {
        let refs = self.poll_elements(selector, scope, timeout, Some(1)).await?;
        Ok(match refs.first() {
            Some(element) => Lookup::Found(*element),
            None => Lookup::NotFound,
        })
    }

    async fn click(&self, element: ElementRef) -> AppResult<()> {
        let elements = self.elements.lock().await;
        let target = elements
            .get(element.0)
            .ok_or_else(|| AppError::Browser(format!("无效的元素句柄 {:?}", element)))?;
        target.click().await?;
        Ok(())
    }

    async fn text(&self, element: ElementRef) -> AppResult<String> {
        let elements = self.elements.lock().await;
        let target = elements
            .get(element.0)
            .ok_or_else(|| AppError::Browser(format!("无效的元素句柄 {:?}", element)))?;
        Ok(target.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> AppResult<Option<String>> {
        let elements = self.elements.lock().await;
        let target = elements
            .get(element.0)
            .ok_or_else(|| AppError::Browser(format!("无效的元素句柄 {:?}", element)))?;
        Ok(target.attribute(name).await?)
    }

    async fn drain_network_log(&self) -> AppResult<Vec<RawLogEntry>> {
        let mut log = self
            .network_log
            .lock()
            .map_err(|_| AppError::Browser("网络日志锁已损坏".to_string()))?;
        Ok(std::mem::take(&mut *log))
    }
}
