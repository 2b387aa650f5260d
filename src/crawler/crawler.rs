//! 爬取编排器
//! 单会话顺序访问页面：加载 -> 检测 -> 合并结果 -> 提取同域链接入队

use tracing::{debug, error, info, warn};
use url::Url;

use super::state::CrawlState;
use crate::config::CrawlConfig;
use crate::detector::{DetectionResult, TechDetector};
use crate::error::WbResult;
use crate::extractor::LinkExtractor;
use crate::page::{PageExecutionService, PageSnapshot};

/// 爬取编排器
#[derive(Debug, Clone)]
pub struct CrawlOrchestrator {
    config: CrawlConfig,
    detector: TechDetector,
}

impl CrawlOrchestrator {
    pub fn new(config: CrawlConfig, detector: TechDetector) -> Self {
        Self { config, detector }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// 从起始URL开始爬取，返回所有已处理页面的合并结果
    ///
    /// 单页加载失败只跳过该页；其余错误终止爬取并返回已累计的部分结果。
    /// 无论以何种方式结束，会话都会被关闭。
    pub async fn crawl<S>(&self, start_url: &Url, service: &mut S) -> DetectionResult
    where
        S: PageExecutionService,
    {
        let mut state = CrawlState::new(start_url.to_string());

        if let Err(e) = self.run(&mut state, service).await {
            error!("爬取中止，返回已获取的部分结果：{}", e);
        }
        service.close().await;

        info!(
            "爬取结束，共访问 {} 个页面，检测到 {} 项技术",
            state.visited_count(),
            state.aggregate().len()
        );
        state.into_aggregate()
    }

    async fn run<S>(&self, state: &mut CrawlState, service: &mut S) -> WbResult<()>
    where
        S: PageExecutionService,
    {
        let mut is_first = true;

        // 页面预算按访问总数计，不跟踪链接深度
        while state.visited_count() < self.config.max_pages {
            let Some(url) = state.next_url() else {
                break;
            };

            if !is_first && !self.config.crawl_delay.is_zero() {
                tokio::time::sleep(self.config.crawl_delay).await;
            }
            is_first = false;

            self.visit(&url, state, service).await?;
        }

        Ok(())
    }

    /// 处理单个页面
    async fn visit<S>(&self, url: &str, state: &mut CrawlState, service: &mut S) -> WbResult<()>
    where
        S: PageExecutionService,
    {
        info!("正在分析 {}", url);

        let page_url = match Url::parse(url) {
            Ok(page_url) => page_url,
            Err(e) => {
                warn!("跳过无效URL {}：{}", url, e);
                state.mark_visited(url);
                return Ok(());
            }
        };

        if let Err(e) = self.load(&page_url, service).await {
            warn!("页面 {} 加载失败，已跳过：{}", url, e);
            state.mark_visited(url);
            return Ok(());
        }

        let (result, links) = {
            let snapshot = PageSnapshot::capture(&*service, &page_url).await?;
            let result = self.detector.detect(&snapshot).await;
            let links = LinkExtractor::extract_same_domain_links(&snapshot, &page_url);
            (result, links)
        };

        state.mark_visited(url);
        debug!("{} 检测到 {} 项技术，发现同域链接 {} 个", url, result.len(), links.len());
        state.merge(result);

        // 排序后入队，保证访问顺序稳定
        let mut links: Vec<String> = links.into_iter().collect();
        links.sort();
        let added = state.enqueue_all(links);
        debug!("新增待访问页面 {} 个", added);

        Ok(())
    }

    /// 导航并等待页面就绪，两者各自受超时约束
    async fn load<S>(&self, url: &Url, service: &mut S) -> WbResult<()>
    where
        S: PageExecutionService,
    {
        service.navigate(url, self.config.page_load_timeout).await?;
        service.wait_ready(self.config.wait_timeout).await
    }
}
