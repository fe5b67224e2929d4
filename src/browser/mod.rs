// src/browser/mod.rs

mod chrome;

pub use chrome::{ChromeOptions, ChromeSession};

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::time::Duration;

/// 会话内某个已定位元素的句柄。只在产生它的会话中有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(pub usize);

/// 带超时查找的结果。找不到属于正常情况，由调用方决定跳过还是报错。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn or_not_found(self, selector: &str, waited: Duration) -> AppResult<T> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(AppError::NotFound {
                selector: selector.to_string(),
                waited_ms: waited.as_millis(),
            }),
        }
    }
}

/// 浏览器网络日志中的一条原始记录，内容为 Chrome performance log 格式的 JSON 文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogEntry {
    pub message: String,
}

impl RawLogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// 已登录的浏览器会话。所有调用都按顺序等待完成，同一时刻只有一个界面操作在进行。
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> AppResult<()>;

    /// 在 `timeout` 内等待至少一个匹配元素出现；超时返回 [`AppError::NotFound`]。
    async fn find_all(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
        timeout: Duration,
    ) -> AppResult<Vec<ElementRef>>;

    async fn find_one(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
        timeout: Duration,
    ) -> AppResult<Lookup<ElementRef>>;

    async fn click(&self, element: ElementRef) -> AppResult<()>;

    async fn text(&self, element: ElementRef) -> AppResult<String>;

    async fn attribute(&self, element: ElementRef, name: &str) -> AppResult<Option<String>>;

    /// 取出并清空目前累积的网络日志。
    async fn drain_network_log(&self) -> AppResult<Vec<RawLogEntry>>;
}
