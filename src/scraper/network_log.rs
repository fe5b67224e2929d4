// src/scraper/network_log.rs

use crate::{
    browser::{BrowserSession, RawLogEntry},
    constants::network_log::REQUEST_WILL_BE_SENT,
    error::AppResult,
};
use log::{debug, trace};
use serde::Deserialize;
use serde_json::Value;
use std::{future::Future, time::Duration};
use tokio::time::Instant;

/// 嵌套的 `message` 字段最多展开几层 (Chrome performance log 中 message 本身是 JSON 字符串)。
const MAX_ENVELOPE_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEvent {
    pub method: String,
    pub request_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Event(NetworkEvent),
    Malformed,
}

#[derive(Deserialize)]
struct CdpMessage {
    method: String,
    #[serde(default)]
    params: Option<CdpParams>,
}

#[derive(Deserialize)]
struct CdpParams {
    #[serde(default)]
    request: Option<CdpRequest>,
}

#[derive(Deserialize)]
struct CdpRequest {
    url: String,
}

impl LogEntry {
    pub fn classify(raw: &RawLogEntry) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(&raw.message) else {
            return LogEntry::Malformed;
        };
        let Some(message) = unwrap_envelope(value, 0) else {
            return LogEntry::Malformed;
        };
        match serde_json::from_value::<CdpMessage>(message) {
            Ok(msg) => LogEntry::Event(NetworkEvent {
                method: msg.method,
                request_url: msg.params.and_then(|p| p.request).map(|r| r.url),
            }),
            Err(_) => LogEntry::Malformed,
        }
    }
}

fn unwrap_envelope(value: Value, depth: usize) -> Option<Value> {
    if depth > MAX_ENVELOPE_DEPTH {
        return None;
    }
    match value {
        Value::String(text) => serde_json::from_str(&text)
            .ok()
            .and_then(|inner| unwrap_envelope(inner, depth + 1)),
        Value::Object(mut map) => {
            if map.contains_key("method") {
                Some(Value::Object(map))
            } else {
                map.remove("message")
                    .and_then(|inner| unwrap_envelope(inner, depth + 1))
            }
        }
        _ => None,
    }
}

/// 在日志中找出第一条请求地址包含内容服务器前缀的 `requestWillBeSent` 事件。
pub fn find_content_url(entries: &[RawLogEntry], content_host_prefix: &str) -> Option<String> {
    let mut malformed = 0usize;
    let found = entries.iter().find_map(|raw| match LogEntry::classify(raw) {
        LogEntry::Event(NetworkEvent {
            method,
            request_url: Some(url),
        }) if method == REQUEST_WILL_BE_SENT && url.contains(content_host_prefix) => Some(url),
        LogEntry::Event(_) => None,
        LogEntry::Malformed => {
            malformed += 1;
            None
        }
    });
    if malformed > 0 {
        trace!("跳过 {} 条无法解析的网络日志", malformed);
    }
    found
}

/// 通过浏览器网络日志找出一次下载点击真正请求的视频地址。
pub struct NetworkLogCorrelator<'a> {
    session: &'a dyn BrowserSession,
    content_host_prefix: &'a str,
    wait: Duration,
    poll: Duration,
}

impl<'a> NetworkLogCorrelator<'a> {
    pub fn new(
        session: &'a dyn BrowserSession,
        content_host_prefix: &'a str,
        wait: Duration,
        poll: Duration,
    ) -> Self {
        Self {
            session,
            content_host_prefix,
            wait,
            poll,
        }
    }

    /// 清空日志后执行 `trigger`，再在等待时间内反复读取日志查找视频地址。
    /// 找不到时返回 `Ok(None)`，这不算错误。
    pub async fn resolve<F>(&self, trigger: F) -> AppResult<Option<String>>
    where
        F: Future<Output = AppResult<()>>,
    {
        let stale = self.session.drain_network_log().await?;
        trace!("触发下载前丢弃 {} 条旧日志", stale.len());

        trigger.await?;

        let deadline = Instant::now() + self.wait;
        loop {
            let entries = self.session.drain_network_log().await?;
            if let Some(url) = find_content_url(&entries, self.content_host_prefix) {
                debug!("从网络日志中找到视频地址: {}", url);
                return Ok(Some(url));
            }
            if Instant::now() >= deadline {
                debug!(
                    "等待 {:?} 后仍未在网络日志中找到包含 '{}' 的请求",
                    self.wait, self.content_host_prefix
                );
                return Ok(None);
            }
            tokio::time::sleep(self.poll).await;
        }
    }
}
