//! 全局配置管理,存储爬取与检测的所有可配置项

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{WbResult, WebBaboonError};

/// 爬取配置
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    // 页面加载超时
    pub page_load_timeout: Duration,
    // 等待页面就绪（body出现）超时
    pub wait_timeout: Duration,
    // 两次页面访问之间的固定间隔
    pub crawl_delay: Duration,
    // 最多访问的页面数（命令行以 --max-depth 暴露）
    pub max_pages: usize,
    // 请求使用的 User-Agent
    pub user_agent: String,
    // 技术特征库路径
    pub technologies_path: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_load_timeout: Duration::from_secs(30),
            wait_timeout: Duration::from_secs(10),
            crawl_delay: Duration::from_secs(1),
            max_pages: 1,
            user_agent: concat!("Mozilla/5.0 (compatible; webbaboon/", env!("CARGO_PKG_VERSION"), ")").to_string(),
            technologies_path: PathBuf::from("technologies.json"),
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> CrawlConfig {
        CrawlConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CrawlConfigBuilder {
        CrawlConfigBuilder::new()
    }
}

/// 配置构建器
#[derive(Debug, Clone, Default)]
pub struct CrawlConfigBuilder {
    config: CrawlConfig,
}

impl CrawlConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_load_timeout(mut self, timeout: Duration) -> Self {
        self.config.page_load_timeout = timeout;
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_timeout = timeout;
        self
    }

    pub fn crawl_delay(mut self, delay: Duration) -> Self {
        self.config.crawl_delay = delay;
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn technologies_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.technologies_path = path.into();
        self
    }

    pub fn build(self) -> CrawlConfig {
        self.config
    }
}

/// 规范化目标URL：未带协议时补全 https://
pub fn normalize_target_url(raw: &str) -> WbResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WebBaboonError::InvalidInput("目标URL为空".to_string()));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    Ok(Url::parse(&with_scheme)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https() {
        let url = normalize_target_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_normalize_keeps_explicit_scheme() {
        let url = normalize_target_url("http://example.com/a?b=1").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.path(), "/a");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(normalize_target_url("   ").is_err());
    }

    #[test]
    fn test_builder_overrides_defaults() {
        let config = ConfigManager::custom()
            .max_pages(5)
            .crawl_delay(Duration::ZERO)
            .build();
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.crawl_delay, Duration::ZERO);
        assert_eq!(config.wait_timeout, Duration::from_secs(10));
    }
}
