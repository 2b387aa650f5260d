//! 静态HTTP页面后端
//! 无浏览器环境下的页面执行服务：直接请求HTML，
//! 以解析后的文档回答选择器查询，不具备JS运行时

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::service::{PageExecutionService, PageRuntime};
use super::snapshot::{Cookie, DomElement, ObservedRequest};
use crate::config::CrawlConfig;
use crate::error::{WbResult, WebBaboonError};
use crate::utils::HeaderConverter;

// 视为页面子资源请求的元素与属性
const SUBRESOURCE_SELECTORS: [(&str, &str); 4] = [
    ("script[src]", "src"),
    ("link[href]", "href"),
    ("img[src]", "src"),
    ("iframe[src]", "src"),
];

/// 已加载页面的状态
#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    final_url: Url,
    html: String,
    headers: HashMap<String, String>,
    requests: Vec<ObservedRequest>,
}

/// 静态HTTP页面执行服务
pub struct StaticHttpService {
    client: Client,
    page: Option<LoadedPage>,
    cookies: Vec<Cookie>,
    closed: bool,
}

impl StaticHttpService {
    /// 创建会话
    pub fn new(config: &CrawlConfig) -> WbResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            page: None,
            cookies: Vec::new(),
            closed: false,
        })
    }

    /// 记录响应中下发的Cookie（同名覆盖）
    fn remember_cookie(&mut self, name: &str, value: &str) {
        match self.cookies.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => self.cookies.push(Cookie::new(name, value)),
        }
    }

    async fn fetch(&mut self, url: &Url, timeout: Duration) -> WbResult<()> {
        let response = self.client.get(url.clone()).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("页面 {} 返回状态码 {}，仍按页面内容检测", url, status);
        }

        let final_url = response.url().clone();
        let headers = HeaderConverter::to_single_value(response.headers());
        let set_cookies: Vec<(String, String)> = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        for (name, value) in &set_cookies {
            self.remember_cookie(name, value);
        }

        let html = response.text().await?;
        let mut requests = vec![ObservedRequest::new(final_url.as_str(), false)];
        requests.extend(collect_subresources(&html, &final_url));

        self.page = Some(LoadedPage {
            url: url.clone(),
            final_url,
            html,
            headers,
            requests,
        });
        Ok(())
    }

    fn loaded(&self) -> WbResult<&LoadedPage> {
        self.page
            .as_ref()
            .ok_or_else(|| WebBaboonError::PageNotReady("尚未加载任何页面".to_string()))
    }
}

#[async_trait]
impl PageRuntime for StaticHttpService {
    async fn evaluate(&self, _script: &str) -> Option<Value> {
        None
    }

    async fn query_elements(&self, selector: &str) -> WbResult<Vec<DomElement>> {
        let page = self.loaded()?;
        select_elements(&page.html, selector)
    }
}

#[async_trait]
impl PageExecutionService for StaticHttpService {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> WbResult<()> {
        if self.closed {
            return Err(WebBaboonError::NavigationError("会话已关闭".to_string()));
        }
        self.page = None;

        match tokio::time::timeout(timeout, self.fetch(url, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(WebBaboonError::Timeout(format!("加载 {} 超过 {:?}", url, timeout))),
        }
    }

    async fn wait_ready(&mut self, _timeout: Duration) -> WbResult<()> {
        let page = self.loaded()?;
        if has_body(&page.html) {
            Ok(())
        } else {
            Err(WebBaboonError::PageNotReady(format!("{} 中没有 body 元素", page.final_url)))
        }
    }

    async fn current_html(&self) -> WbResult<String> {
        Ok(self.loaded()?.html.clone())
    }

    async fn cookies(&self) -> Vec<Cookie> {
        self.cookies.clone()
    }

    async fn response_headers(&self, url: &Url) -> HashMap<String, String> {
        match &self.page {
            Some(page) if &page.url == url || &page.final_url == url => page.headers.clone(),
            _ => HashMap::new(),
        }
    }

    async fn observed_requests(&self) -> Vec<ObservedRequest> {
        self.page.as_ref().map(|p| p.requests.clone()).unwrap_or_default()
    }

    async fn close(&mut self) {
        if !self.closed {
            debug!("静态HTTP会话已关闭");
        }
        self.closed = true;
        self.page = None;
        self.cookies.clear();
    }
}

// ======== 文档解析辅助（scraper::Html 非 Send，不跨越 await） ========

fn has_body(html: &str) -> bool {
    let document = Html::parse_document(html);
    match Selector::parse("body") {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    }
}

fn select_elements(html: &str, selector: &str) -> WbResult<Vec<DomElement>> {
    let parsed = Selector::parse(selector)
        .map_err(|e| WebBaboonError::SelectorError(format!("{}：{:?}", selector, e)))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&parsed)
        .map(|element| DomElement {
            attributes: element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            text: element.text().collect::<Vec<_>>().join(""),
        })
        .collect())
}

fn collect_subresources(html: &str, base: &Url) -> Vec<ObservedRequest> {
    let document = Html::parse_document(html);
    let mut requests = Vec::new();

    for (css, attr) in SUBRESOURCE_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            warn!("内置选择器无效：{}", css);
            continue;
        };
        for element in document.select(&selector) {
            let Some(value) = element.value().attr(attr) else {
                continue;
            };
            if let Ok(absolute) = base.join(value.trim()) {
                if matches!(absolute.scheme(), "http" | "https") {
                    requests.push(ObservedRequest::new(absolute.as_str(), false));
                }
            }
        }
    }

    requests
}
