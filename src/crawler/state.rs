//! 爬取状态：已访问集合、待访问队列与累计结果

use std::collections::{HashSet, VecDeque};

use crate::detector::DetectionResult;
use crate::utils::SignatureAggregator;

/// 爬取状态，由编排器独占
///
/// 已访问集合与待访问队列始终不相交。
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: HashSet<String>,
    frontier: VecDeque<String>,
    // 队列成员索引，避免重复入队
    queued: HashSet<String>,
    aggregate: DetectionResult,
}

impl CrawlState {
    pub fn new(start_url: impl Into<String>) -> Self {
        let mut state = Self::default();
        state.enqueue(start_url.into());
        state
    }

    /// 入队一个URL；已访问或已在队列中时返回 false
    pub fn enqueue(&mut self, url: String) -> bool {
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.frontier.push_back(url);
        true
    }

    /// 批量入队，返回新增数量
    pub fn enqueue_all<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        urls.into_iter().filter(|url| self.enqueue(url.clone())).count()
    }

    /// 按先进先出取出下一个未访问的URL
    pub fn next_url(&mut self) -> Option<String> {
        while let Some(url) = self.frontier.pop_front() {
            self.queued.remove(&url);
            if !self.visited.contains(&url) {
                return Some(url);
            }
        }
        None
    }

    pub fn mark_visited(&mut self, url: &str) {
        self.queued.remove(url);
        self.frontier.retain(|queued| queued != url);
        self.visited.insert(url.to_string());
    }

    pub fn merge(&mut self, result: DetectionResult) {
        SignatureAggregator::merge_into(&mut self.aggregate, result);
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn aggregate(&self) -> &DetectionResult {
        &self.aggregate
    }

    pub fn into_aggregate(self) -> DetectionResult {
        self.aggregate
    }
}
