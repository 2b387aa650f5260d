//! 页面执行服务接口
//! 浏览器/网络捕获层对检测核心暴露的最小能力集合

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use super::property_path::{runtime_value_to_string, PropertyPath};
use super::snapshot::{Cookie, DomElement, ObservedRequest};
use crate::error::WbResult;

/// 页面运行时：脚本求值与CSS选择器查询
#[async_trait]
pub trait PageRuntime: Send + Sync {
    /// 对一段JS表达式求值；任何求值错误都表现为 `None`，不会抛出
    async fn evaluate(&self, script: &str) -> Option<Value>;

    /// 查询匹配选择器的元素
    async fn query_elements(&self, selector: &str) -> WbResult<Vec<DomElement>>;

    /// 读取属性路径的值，路径上任一对象缺失即为 `None`
    async fn read_property(&self, path: &PropertyPath) -> Option<String> {
        let value = self.evaluate(&path.to_accessor_expression()).await?;
        runtime_value_to_string(value)
    }
}

/// 页面执行服务（单会话，同一时刻只加载一个页面）
#[async_trait]
pub trait PageExecutionService: PageRuntime {
    /// 导航到页面，超时或加载失败返回错误
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> WbResult<()>;

    /// 等待页面就绪（body 出现）
    async fn wait_ready(&mut self, timeout: Duration) -> WbResult<()>;

    /// 当前页面的完整HTML
    async fn current_html(&self) -> WbResult<String>;

    /// 当前会话可见的Cookie
    async fn cookies(&self) -> Vec<Cookie>;

    /// 指定请求的响应头；不可用时为空
    async fn response_headers(&self, url: &Url) -> HashMap<String, String>;

    /// 当前页面加载过程中观察到的出站请求
    async fn observed_requests(&self) -> Vec<ObservedRequest>;

    /// 释放会话资源，可重复调用
    async fn close(&mut self);
}
