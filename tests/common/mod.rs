// tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use echo_dl::{
    browser::{BrowserSession, ElementRef, Lookup, RawLogEntry},
    config::AppConfig,
    constants::network_log::REQUEST_WILL_BE_SENT,
    error::{AppError, AppResult},
};
use std::{collections::HashMap, sync::Mutex, time::Duration};

pub const COURSES_URL: &str = "https://echo360.net.au/courses";

/// 内存中的页面节点。节点通过它“匹配”的选择器字符串来查找，而不是真正解析 CSS。
#[derive(Debug, Default, Clone)]
struct FakeNode {
    page: String,
    selector: String,
    parent: Option<usize>,
    text: String,
    attrs: HashMap<String, String>,
    visible: bool,
    reveals: Vec<usize>,
    hides: Vec<usize>,
    emits: Vec<RawLogEntry>,
}

#[derive(Debug, Default)]
struct FakeState {
    nodes: Vec<FakeNode>,
    current_page: String,
    network_log: Vec<RawLogEntry>,
    clicks: Vec<usize>,
    visited: Vec<String>,
    unreachable_pages: Vec<String>,
    broken_nodes: Vec<usize>,
}

/// 测试用的浏览器会话：所有查找立即返回，点击按预设规则显示/隐藏节点并写入网络日志。
#[derive(Debug, Default)]
pub struct FakeSession {
    state: Mutex<FakeState>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, page: &str, parent: Option<usize>, selector: &str) -> usize {
        let state = self.state.get_mut().unwrap();
        state.nodes.push(FakeNode {
            page: page.to_string(),
            selector: selector.to_string(),
            parent,
            visible: true,
            ..Default::default()
        });
        state.nodes.len() - 1
    }

    pub fn text_node(&mut self, page: &str, parent: usize, selector: &str, text: &str) -> usize {
        let id = self.node(page, Some(parent), selector);
        self.state.get_mut().unwrap().nodes[id].text = text.to_string();
        id
    }

    pub fn set_attr(&mut self, id: usize, name: &str, value: &str) {
        self.state.get_mut().unwrap().nodes[id]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    pub fn hide(&mut self, id: usize) {
        self.state.get_mut().unwrap().nodes[id].visible = false;
    }

    pub fn on_click_reveal(&mut self, id: usize, target: usize) {
        self.state.get_mut().unwrap().nodes[id].reveals.push(target);
    }

    pub fn on_click_hide(&mut self, id: usize, target: usize) {
        self.state.get_mut().unwrap().nodes[id].hides.push(target);
    }

    pub fn on_click_log(&mut self, id: usize, entry: RawLogEntry) {
        self.state.get_mut().unwrap().nodes[id].emits.push(entry);
    }

    /// 之后导航到 `page` 时返回浏览器错误。
    pub fn make_unreachable(&mut self, page: &str) {
        self.state.get_mut().unwrap().unreachable_pages.push(page.to_string());
    }

    /// 之后点击该节点时返回浏览器错误。
    pub fn break_clicks(&mut self, id: usize) {
        self.state.get_mut().unwrap().broken_nodes.push(id);
    }

    /// 页面上匹配选择器的全部节点 (含隐藏节点)，按创建顺序。
    pub fn ids_of(&self, page: &str, selector: &str) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.page == page && n.selector == selector)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn push_log(&self, entry: RawLogEntry) {
        self.state.lock().unwrap().network_log.push(entry);
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    fn is_within(state: &FakeState, id: usize, scope: usize) -> bool {
        let mut current = state.nodes[id].parent;
        while let Some(parent) = current {
            if parent == scope {
                return true;
            }
            current = state.nodes[parent].parent;
        }
        false
    }

    fn matching(&self, selector: &str, scope: Option<ElementRef>) -> AppResult<Vec<ElementRef>> {
        let state = self.state.lock().unwrap();
        if let Some(ElementRef(scope_id)) = scope {
            if scope_id >= state.nodes.len() {
                return Err(AppError::Browser(format!("无效的元素句柄 {}", scope_id)));
            }
        }
        Ok(state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.visible && n.page == state.current_page && n.selector == selector)
            .filter(|(id, _)| scope.is_none_or(|ElementRef(s)| Self::is_within(&state, *id, s)))
            .map(|(id, _)| ElementRef(id))
            .collect())
    }

    fn with_node<T>(&self, element: ElementRef, f: impl FnOnce(&FakeNode) -> T) -> AppResult<T> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .get(element.0)
            .map(f)
            .ok_or_else(|| AppError::Browser(format!("无效的元素句柄 {:?}", element)))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.visited.push(url.to_string());
        if state.unreachable_pages.iter().any(|p| p == url) {
            return Err(AppError::Browser(format!("net::ERR_TIMED_OUT at {}", url)));
        }
        state.current_page = url.to_string();
        Ok(())
    }

    async fn find_all(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
        timeout: Duration,
    ) -> AppResult<Vec<ElementRef>> {
        let found = self.matching(selector, scope)?;
        if found.is_empty() {
            return Err(AppError::NotFound {
                selector: selector.to_string(),
                waited_ms: timeout.as_millis(),
            });
        }
        Ok(found)
    }

    async fn find_one(
        &self,
        selector: &str,
        scope: Option<ElementRef>,
        _timeout: Duration,
    ) -> AppResult<Lookup<ElementRef>> {
        Ok(match self.matching(selector, scope)?.into_iter().next() {
            Some(element) => Lookup::Found(element),
            None => Lookup::NotFound,
        })
    }

    async fn click(&self, element: ElementRef) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        let node = state
            .nodes
            .get(element.0)
            .cloned()
            .ok_or_else(|| AppError::Browser(format!("无效的元素句柄 {:?}", element)))?;
        if !node.visible {
            return Err(AppError::Browser(format!("元素 {:?} 不可见", element)));
        }
        if state.broken_nodes.contains(&element.0) {
            return Err(AppError::Browser(format!("元素 {:?} 点击无响应", element)));
        }
        state.clicks.push(element.0);
        for id in node.reveals {
            state.nodes[id].visible = true;
        }
        for id in node.hides {
            state.nodes[id].visible = false;
        }
        state.network_log.extend(node.emits);
        Ok(())
    }

    async fn text(&self, element: ElementRef) -> AppResult<String> {
        self.with_node(element, |n| n.text.clone())
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> AppResult<Option<String>> {
        self.with_node(element, |n| n.attrs.get(name).cloned())
    }

    async fn drain_network_log(&self) -> AppResult<Vec<RawLogEntry>> {
        Ok(std::mem::take(&mut self.state.lock().unwrap().network_log))
    }
}

/// 模拟 chromedriver performance log 的一条记录 (外层 message 为 JSON 字符串)。
pub fn request_log(url: &str) -> RawLogEntry {
    let inner = serde_json::json!({
        "message": {
            "method": REQUEST_WILL_BE_SENT,
            "params": { "request": { "url": url } }
        }
    });
    RawLogEntry::new(serde_json::json!({ "message": inner.to_string() }).to_string())
}

pub struct CardSpec<'a> {
    pub href: &'a str,
    pub lecture_count: &'a str,
    pub term_title: &'a str,
    pub year_title: &'a str,
    pub info_title: &'a str,
}

/// 在课程列表页上添加一张课程卡片，返回卡片节点。
pub fn add_course_card(session: &mut FakeSession, config: &AppConfig, card: CardSpec) -> usize {
    let s = &config.selectors;
    let title = s.title_attribute.as_str();
    let id = session.node(COURSES_URL, None, &s.course_card);
    let link = session.node(COURSES_URL, Some(id), &s.course_link);
    session.set_attr(link, "href", card.href);
    session.text_node(COURSES_URL, id, &s.course_lecture_count, card.lecture_count);
    let term = session.node(COURSES_URL, Some(id), &s.course_term);
    session.set_attr(term, title, card.term_title);
    let year = session.node(COURSES_URL, Some(id), &s.course_year);
    session.set_attr(year, title, card.year_title);
    let info = session.node(COURSES_URL, Some(id), &s.course_info);
    session.set_attr(info, title, card.info_title);
    id
}

pub struct OptionSpec<'a> {
    pub label: &'a str,
    /// 点击下载后写入网络日志的请求地址。
    pub requests: Vec<String>,
}

pub struct SourceSpec<'a> {
    pub label: &'a str,
    pub options: Vec<OptionSpec<'a>>,
}

pub struct RowSpec<'a> {
    pub title: &'a str,
    pub date: &'a str,
    pub time: &'a str,
    /// `None` 表示没有视频菜单 (无录像)。
    pub sources: Option<Vec<SourceSpec<'a>>>,
    pub has_close_button: bool,
}

impl<'a> RowSpec<'a> {
    pub fn new(title: &'a str, date: &'a str, time: &'a str) -> Self {
        Self {
            title,
            date,
            time,
            sources: None,
            has_close_button: true,
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceSpec<'a>>) -> Self {
        self.sources = Some(sources);
        self
    }
}

/// 在课程页上添加一个课时行以及它的菜单和下载对话框。返回课时行节点。
pub fn add_lecture_row(
    session: &mut FakeSession,
    config: &AppConfig,
    page: &str,
    row: RowSpec,
) -> usize {
    let s = &config.selectors;
    let row_id = session.node(page, None, &s.lecture_row);
    session.text_node(page, row_id, &s.lecture_title, row.title);
    session.text_node(page, row_id, &s.lecture_date, row.date);
    session.text_node(page, row_id, &s.lecture_time, row.time);

    let Some(sources) = row.sources else {
        return row_id;
    };

    let menu = session.node(page, Some(row_id), &s.menu_button);
    let action = session.node(page, None, &s.download_original);
    session.hide(action);
    session.on_click_reveal(menu, action);

    let dialog = session.node(page, None, &s.download_dialog);
    session.hide(dialog);
    session.on_click_reveal(action, dialog);

    for source in sources {
        let source_row = session.node(page, Some(dialog), &s.source_row);
        session.text_node(page, source_row, &s.source_label, source.label);
        for option in source.options {
            let option_id = session.text_node(page, source_row, &s.quality_option, option.label);
            let trigger = session.node(page, Some(option_id), &s.quality_trigger);
            for url in option.requests {
                session.on_click_log(trigger, request_log(&url));
            }
        }
    }

    if row.has_close_button {
        let close = session.node(page, Some(dialog), &s.dialog_close);
        session.on_click_hide(close, dialog);
        session.on_click_hide(close, action);
    }
    row_id
}

/// 两个视频源、各有高清和标清选项的标准对话框。
pub fn two_source_dialog<'a>(hd_request: Option<String>) -> Vec<SourceSpec<'a>> {
    vec![
        SourceSpec {
            label: "Source 1",
            options: vec![
                OptionSpec {
                    label: "Full Quality (1.2 GB)",
                    requests: hd_request.into_iter().collect(),
                },
                OptionSpec {
                    label: "Standard Quality (340 MB)",
                    requests: vec![],
                },
            ],
        },
        SourceSpec {
            label: "Source 2",
            options: vec![
                OptionSpec {
                    label: "Full Quality (900 MB)",
                    requests: vec![],
                },
                OptionSpec {
                    label: "Standard Quality (210 MB)",
                    requests: vec![],
                },
            ],
        },
    ]
}
