//! 通道分析器：每个特征通道一个分析器，互相独立，结果取并集

use tracing::debug;

use crate::compiler::{CompiledPattern, CompiledTechnology};
use crate::detector::{Channel, SignatureMatch};
use crate::page::PageSnapshot;

pub mod markup;
pub mod transport;
pub mod dom;
pub mod js;

pub use self::markup::{HtmlAnalyzer, MetaAnalyzer, ScriptSrcAnalyzer};
pub use self::transport::{CookieAnalyzer, HeaderAnalyzer, NetworkAnalyzer, XhrAnalyzer};
pub use self::dom::DomAnalyzer;
pub use self::js::JsAnalyzer;

/// 同步通道分析器的通用抽象：只读快照 -> 命中特征
pub trait Analyzer {
    /// 分析器对应的通道
    const CHANNEL: Channel;

    /// 对单个技术执行本通道检查
    fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch>;
}

/// 在一组候选值中查找首个命中，返回命中时提取的版本
pub(crate) fn first_match<'a, I>(pattern: &CompiledPattern, candidates: I) -> Option<Option<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find_map(|candidate| pattern.match_version(candidate))
}

/// 匹配成功通用处理器 - 标准日志输出 + 构造命中特征
pub(crate) fn matched(
    channel: Channel,
    tech_name: &str,
    detail: String,
    version: Option<String>,
) -> SignatureMatch {
    debug!(
        "[{}]匹配成功 | 技术: {} | 规则: {} | 版本: {:?}",
        channel, tech_name, detail, version
    );
    SignatureMatch::new(channel, detail).with_version(version)
}

// 各分析器测试共用：编译单个技术规则、打开预置页面
#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use url::Url;

    use crate::compiler::{CompileStats, CompiledTechnology, RuleCompiler};
    use crate::page::fake::{FakePage, FakeService};
    use crate::page::PageExecutionService;
    use crate::rule::TechnologyDefinition;

    pub const PAGE_URL: &str = "https://site.example/";

    pub fn technology(json: &str) -> CompiledTechnology {
        let def: TechnologyDefinition = serde_json::from_str(json).unwrap();
        RuleCompiler::compile_technology("Foo", &def, &mut CompileStats::default())
    }

    pub async fn open(page: FakePage) -> (FakeService, Url) {
        let url = Url::parse(PAGE_URL).unwrap();
        let mut service = FakeService::new().with_page(PAGE_URL, page);
        service.navigate(&url, Duration::from_secs(1)).await.unwrap();
        (service, url)
    }
}
