//! 全局错误类型定义

use thiserror::Error;
use serde_json::Error as SerdeJsonError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum WebBaboonError {
    // 规则相关错误
    #[error("规则加载失败：{0}")]
    RuleLoadError(String),
    #[error("规则解析失败：{0}")]
    RuleParseError(String),

    // 页面执行相关错误
    #[error("页面导航失败：{0}")]
    NavigationError(String),
    #[error("等待超时：{0}")]
    Timeout(String),
    #[error("页面未就绪：{0}")]
    PageNotReady(String),
    #[error("CSS选择器查询失败：{0}")]
    SelectorError(String),

    // 网络相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type WbResult<T> = Result<T, WebBaboonError>;
