//! 爬取模块：有界页面预算下的顺序爬取
pub mod state;
pub mod crawler;

pub use self::state::CrawlState;
pub use self::crawler::CrawlOrchestrator;
