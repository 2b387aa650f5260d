//! 测试用页面执行服务：按URL返回预置页面

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::property_path::PropertyPath;
use super::service::{PageExecutionService, PageRuntime};
use super::snapshot::{Cookie, DomElement, ObservedRequest};
use crate::error::{WbResult, WebBaboonError};

/// 预置页面
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub html: String,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<Cookie>,
    pub requests: Vec<ObservedRequest>,
    pub scripts: HashMap<String, Value>,
    pub elements: HashMap<String, Vec<DomElement>>,
    pub broken_selectors: Vec<String>,
    pub fail_navigation: bool,
    pub fail_ready: bool,
    pub fail_html: bool,
}

impl FakePage {
    pub fn html(html: &str) -> Self {
        Self {
            html: html.to_string(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_navigation: true,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(Cookie::new(name, value));
        self
    }

    pub fn with_request(mut self, url: &str, is_xhr: bool) -> Self {
        self.requests.push(ObservedRequest::new(url, is_xhr));
        self
    }

    /// 预置JS变量路径的取值
    pub fn with_js(self, variable: &str, value: Value) -> Self {
        let script = PropertyPath::parse(variable)
            .expect("测试变量路径必须合法")
            .to_accessor_expression();
        let value = match value {
            Value::Null => Value::Null,
            Value::String(s) => Value::String(s),
            other => Value::String(other.to_string()),
        };
        self.with_script(&script, value)
    }

    /// 预置任意脚本的返回值
    pub fn with_script(mut self, script: &str, value: Value) -> Self {
        self.scripts.insert(script.to_string(), value);
        self
    }

    pub fn with_elements(mut self, selector: &str, elements: Vec<DomElement>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }

    pub fn with_broken_selector(mut self, selector: &str) -> Self {
        self.broken_selectors.push(selector.to_string());
        self
    }
}

/// 测试用服务，记录访问顺序与关闭状态
#[derive(Debug, Default)]
pub struct FakeService {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    pub visits: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        let key = Url::parse(url).expect("测试URL必须合法").to_string();
        self.pages.insert(key, page);
        self
    }

    fn current_page(&self) -> WbResult<&FakePage> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .ok_or_else(|| WebBaboonError::PageNotReady("没有当前页面".to_string()))
    }
}

#[async_trait]
impl PageRuntime for FakeService {
    async fn evaluate(&self, script: &str) -> Option<Value> {
        let page = self.current_page().ok()?;
        page.scripts.get(script).cloned().filter(|v| !v.is_null())
    }

    async fn query_elements(&self, selector: &str) -> WbResult<Vec<DomElement>> {
        let page = self.current_page()?;
        if page.broken_selectors.iter().any(|s| s == selector) {
            return Err(WebBaboonError::SelectorError(selector.to_string()));
        }
        Ok(page.elements.get(selector).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl PageExecutionService for FakeService {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> WbResult<()> {
        self.visits.lock().unwrap().push(url.to_string());
        self.current = None;
        match self.pages.get(url.as_str()) {
            Some(page) if page.fail_navigation => {
                Err(WebBaboonError::Timeout(format!("加载 {} 超过 {:?}", url, timeout)))
            }
            Some(_) => {
                self.current = Some(url.to_string());
                Ok(())
            }
            None => Err(WebBaboonError::NavigationError(format!("404 {}", url))),
        }
    }

    async fn wait_ready(&mut self, _timeout: Duration) -> WbResult<()> {
        let page = self.current_page()?;
        if page.fail_ready {
            return Err(WebBaboonError::PageNotReady("body 未出现".to_string()));
        }
        Ok(())
    }

    async fn current_html(&self) -> WbResult<String> {
        let page = self.current_page()?;
        if page.fail_html {
            return Err(WebBaboonError::InvalidInput("页面内容不可读".to_string()));
        }
        Ok(page.html.clone())
    }

    async fn cookies(&self) -> Vec<Cookie> {
        self.current_page().map(|p| p.cookies.clone()).unwrap_or_default()
    }

    async fn response_headers(&self, _url: &Url) -> HashMap<String, String> {
        self.current_page().map(|p| p.headers.clone()).unwrap_or_default()
    }

    async fn observed_requests(&self) -> Vec<ObservedRequest> {
        self.current_page().map(|p| p.requests.clone()).unwrap_or_default()
    }

    async fn close(&mut self) {
        *self.closed.lock().unwrap() = true;
        self.current = None;
    }
}
