//! 页面快照：单次页面加载的只读视图
//! 检测与链接提取完成后即丢弃，不会被结果合并持有

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use super::service::{PageExecutionService, PageRuntime};
use crate::error::WbResult;
use crate::extractor::HtmlExtractor;

/// Cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 观察到的出站请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedRequest {
    pub url: String,
    pub is_xhr: bool,
}

impl ObservedRequest {
    pub fn new(url: impl Into<String>, is_xhr: bool) -> Self {
        Self {
            url: url.into(),
            is_xhr,
        }
    }
}

/// 选择器查询得到的元素
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomElement {
    pub attributes: HashMap<String, String>,
    pub text: String,
}

impl DomElement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            attributes: HashMap::new(),
            text: text.into(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// 页面快照
pub struct PageSnapshot<'a> {
    pub url: Url,
    pub html: String,
    pub cookies: Vec<Cookie>,
    pub headers: HashMap<String, String>,
    pub requests: Vec<ObservedRequest>,
    // HTML中解析出的 script-src / meta / a-href
    pub script_srcs: Vec<String>,
    pub meta_tags: Vec<(String, String)>,
    pub anchor_hrefs: Vec<String>,
    runtime: &'a dyn PageRuntime,
}

impl<'a> PageSnapshot<'a> {
    /// 由HTML构造快照，其余通道为空
    pub fn new(url: Url, html: impl Into<String>, runtime: &'a dyn PageRuntime) -> Self {
        let html = html.into();
        let extracted = HtmlExtractor::new().extract(&html);

        Self {
            url,
            script_srcs: extracted.get_script_srcs(),
            meta_tags: extracted.get_meta_tags(),
            anchor_hrefs: extracted.get_anchor_hrefs(),
            html,
            cookies: Vec::new(),
            headers: HashMap::new(),
            requests: Vec::new(),
            runtime,
        }
    }

    /// 从页面执行服务采集当前页面的快照
    pub async fn capture<S>(service: &'a S, url: &Url) -> WbResult<PageSnapshot<'a>>
    where
        S: PageExecutionService,
    {
        let html = service.current_html().await?;
        let cookies = service.cookies().await;
        let headers = service.response_headers(url).await;
        let requests = service.observed_requests().await;

        Ok(Self::new(url.clone(), html, service)
            .with_cookies(cookies)
            .with_headers(headers)
            .with_requests(requests))
    }

    pub fn with_cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_requests(mut self, requests: Vec<ObservedRequest>) -> Self {
        self.requests = requests;
        self
    }

    pub fn runtime(&self) -> &'a dyn PageRuntime {
        self.runtime
    }

    /// 所有出站请求URL
    pub fn request_urls(&self) -> impl Iterator<Item = &str> {
        self.requests.iter().map(|r| r.url.as_str())
    }

    /// 标记为XHR的请求URL
    pub fn xhr_urls(&self) -> impl Iterator<Item = &str> {
        self.requests.iter().filter(|r| r.is_xhr).map(|r| r.url.as_str())
    }
}
