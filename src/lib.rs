//! webbaboon - 基于浏览器上下文的网站技术栈检测与同域爬取工具

// 导出全局错误类型
pub use self::error::{WbResult, WebBaboonError};

// 导出配置模块
pub use self::config::{normalize_target_url, ConfigManager, CrawlConfig, CrawlConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{DomCondition, DomRule, RuleLoader, TechnologyDb, TechnologyDefinition};

// 导出编译模块核心接口
pub use self::compiler::{CompiledPattern, CompiledTechnology, CompiledTechnologyDb, RuleCompiler};

// 导出提取模块核心接口
pub use self::extractor::{HtmlExtractor, LinkExtractor};

// 导出页面执行接口
pub use self::page::{
    Cookie, DomElement, ObservedRequest, PageExecutionService, PageRuntime, PageSnapshot, PropertyPath,
};
#[cfg(feature = "http-backend")]
pub use self::page::StaticHttpService;

// 导出检测模块核心接口
pub use self::detector::{Channel, DetectedTechnology, DetectionResult, SignatureMatch, TechDetector, VersionProbe};

// 导出工具模块核心接口
pub use self::utils::{HeaderConverter, SignatureAggregator, VersionExtractor};

// 导出爬取模块核心接口
pub use self::crawler::{CrawlOrchestrator, CrawlState};

// 声明所有子模块
pub mod error;
pub mod config;
pub mod rule;
pub mod compiler;
pub mod extractor;
pub mod page;
pub mod analyzer;
pub mod detector;
pub mod utils;
pub mod crawler;
