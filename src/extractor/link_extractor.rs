//! 同域链接提取器
//! 将页面中的 a-href 解析为绝对URL，仅保留与基准URL同主机的链接

use std::collections::HashSet;

use tracing::debug;
use url::Url;

use super::html_extractor::HtmlExtractor;
use crate::page::PageSnapshot;

/// 同域链接提取器
pub struct LinkExtractor;

impl LinkExtractor {
    /// 从页面快照提取同域链接
    pub fn extract_same_domain_links(snapshot: &PageSnapshot<'_>, base_url: &Url) -> HashSet<String> {
        Self::resolve_same_domain(&snapshot.anchor_hrefs, base_url)
    }

    /// 从原始HTML提取同域链接
    pub fn extract_from_html(html: &str, base_url: &Url) -> HashSet<String> {
        let hrefs = HtmlExtractor::new().extract(html).get_anchor_hrefs();
        Self::resolve_same_domain(&hrefs, base_url)
    }

    /// 解析并过滤链接；无法解析的 href 直接跳过
    pub fn resolve_same_domain<S: AsRef<str>>(hrefs: &[S], base_url: &Url) -> HashSet<String> {
        let Some(base_host) = base_url.host_str() else {
            return HashSet::new();
        };

        let mut links = HashSet::new();
        for href in hrefs {
            let href = href.as_ref();
            let Ok(mut absolute) = base_url.join(href) else {
                debug!("跳过无法解析的链接：{}", href);
                continue;
            };
            if absolute.host_str() != Some(base_host) {
                continue;
            }
            // 锚点不代表新页面
            absolute.set_fragment(None);
            links.insert(absolute.to_string());
        }
        links
    }
}
