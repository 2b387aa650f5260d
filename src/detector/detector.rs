//! 检测器核心：整合各类分析器，输出检测结果
//! 两阶段流水线：先执行廉价的通道检测得到候选技术，再仅对候选技术提取版本

use std::sync::Arc;

use tracing::debug;

use super::result::{Channel, DetectionResult, SignatureMatch};
use super::version_probe::VersionProbe;
use crate::analyzer::{
    Analyzer, CookieAnalyzer, DomAnalyzer, HeaderAnalyzer, HtmlAnalyzer, JsAnalyzer, MetaAnalyzer,
    NetworkAnalyzer, ScriptSrcAnalyzer, XhrAnalyzer,
};
use crate::compiler::{CompiledTechnology, CompiledTechnologyDb, RuleCompiler};
use crate::page::{runtime_value_to_string, PageSnapshot};
use crate::rule::TechnologyDb;

/// 技术检测器
///
/// 不持有任何页面状态，可在多个页面之间复用。
#[derive(Debug, Clone)]
pub struct TechDetector {
    compiled_db: Arc<CompiledTechnologyDb>,
}

impl TechDetector {
    /// 编译特征库并创建检测器
    pub fn new(db: &TechnologyDb) -> Self {
        Self::from_compiled(RuleCompiler::compile(db))
    }

    pub fn from_compiled(compiled_db: CompiledTechnologyDb) -> Self {
        Self {
            compiled_db: Arc::new(compiled_db),
        }
    }

    pub fn compiled_db(&self) -> &CompiledTechnologyDb {
        &self.compiled_db
    }

    /// 完整检测：通道检测 + 候选技术的版本提取
    pub async fn detect(&self, snapshot: &PageSnapshot<'_>) -> DetectionResult {
        let mut result = self.detect_candidates(snapshot).await;
        if !result.is_empty() {
            self.enrich_versions(snapshot, &mut result).await;
        }
        result
    }

    /// 第一阶段：逐技术执行所有通道检查，结果取并集
    pub async fn detect_candidates(&self, snapshot: &PageSnapshot<'_>) -> DetectionResult {
        let mut result = DetectionResult::new();

        for tech in self.compiled_db.iter() {
            let signatures = Self::check_technology(tech, snapshot).await;
            result.extend(&tech.name, signatures);
        }

        debug!("{} 通道检测完成，候选技术 {} 个", snapshot.url, result.len());
        result
    }

    /// 第二阶段：仅对已检测到的技术执行JS取值与专用版本探针
    pub async fn enrich_versions(&self, snapshot: &PageSnapshot<'_>, result: &mut DetectionResult) {
        let candidates: Vec<String> = result.names().cloned().collect();
        let runtime = snapshot.runtime();

        for name in candidates {
            if let Some(tech) = self.compiled_db.get(&name) {
                let signatures = JsAnalyzer::extract_versions(tech, snapshot).await;
                result.extend(&name, signatures);
            }

            let Some(script) = VersionProbe::script_for(&name) else {
                continue;
            };
            let version = runtime
                .evaluate(&script)
                .await
                .and_then(runtime_value_to_string)
                .filter(|v| !v.trim().is_empty());
            if let Some(version) = version {
                debug!("[{}]版本探针命中 | 技术: {} | 版本: {}", Channel::JsVersion, name, version);
                let signature = SignatureMatch::new(Channel::JsVersion, VersionProbe::detail_for(&name))
                    .with_output(version.clone())
                    .with_version(Some(version));
                result.insert(&name, signature);
            }
        }
    }

    /// 单个技术的全部通道检查；各通道互相独立
    async fn check_technology(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        let mut signatures = Vec::new();
        signatures.extend(HtmlAnalyzer::check(tech, snapshot));
        signatures.extend(MetaAnalyzer::check(tech, snapshot));
        signatures.extend(CookieAnalyzer::check(tech, snapshot));
        signatures.extend(HeaderAnalyzer::check(tech, snapshot));
        signatures.extend(NetworkAnalyzer::check(tech, snapshot));
        signatures.extend(ScriptSrcAnalyzer::check(tech, snapshot));
        signatures.extend(XhrAnalyzer::check(tech, snapshot));
        signatures.extend(DomAnalyzer::check(tech, snapshot).await);
        signatures.extend(JsAnalyzer::detect(tech, snapshot).await);
        signatures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::fake::{FakePage, FakeService};
    use crate::page::{DomElement, PageExecutionService};
    use crate::rule::RuleLoader;
    use serde_json::json;
    use std::time::Duration;
    use url::Url;

    const PAGE: &str = "https://site.example/";

    fn detector(json: &str) -> TechDetector {
        TechDetector::new(&RuleLoader::from_json_str(json).unwrap())
    }

    async fn detect_on(detector: &TechDetector, page: FakePage) -> DetectionResult {
        let url = Url::parse(PAGE).unwrap();
        let mut service = FakeService::new().with_page(PAGE, page);
        service.navigate(&url, Duration::from_secs(1)).await.unwrap();
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();
        detector.detect(&snapshot).await
    }

    fn signatures_of(result: &DetectionResult, name: &str) -> Vec<SignatureMatch> {
        let mut signatures: Vec<_> = result.get(name).unwrap().iter().cloned().collect();
        signatures.sort();
        signatures
    }

    #[tokio::test]
    async fn test_header_detection() {
        let detector = detector(r#"{"Foo": {"headers": {"X-Powered-By": "Foo"}}}"#);
        let page = FakePage::html("<html><body></body></html>").with_header("X-Powered-By", "Foo/2.1");

        let result = detect_on(&detector, page).await;
        assert_eq!(
            signatures_of(&result, "Foo"),
            vec![SignatureMatch::new(Channel::Headers, "X-Powered-By: Foo")]
        );
    }

    #[tokio::test]
    async fn test_js_presence_and_probe_version() {
        let detector = detector(r#"{"jQuery": {"js": {"jQuery.fn.jquery": ""}}}"#);
        let probe = VersionProbe::script_for("jQuery").unwrap();
        let page = FakePage::html("<html><body></body></html>")
            .with_js("jQuery.fn.jquery", json!("3.6.0"))
            .with_script(&probe, json!("3.6.0"));

        let result = detect_on(&detector, page).await;
        let signatures = signatures_of(&result, "jQuery");
        assert!(signatures.contains(&SignatureMatch::new(Channel::Js, "jQuery.fn.jquery")));
        assert!(signatures.contains(
            &SignatureMatch::new(Channel::JsVersion, "Version check: jQuery")
                .with_output("3.6.0")
                .with_version(Some("3.6.0".to_string()))
        ));

        let report = result.into_report();
        assert_eq!(report[0].versions, vec!["3.6.0".to_string()]);
    }

    #[tokio::test]
    async fn test_js_directive_version() {
        let detector = detector(r#"{"Foo": {"js": {"Foo.build": "v1.2.3;version:(.+)"}}}"#);
        let page = FakePage::html("<html><body></body></html>").with_js("Foo.build", json!("v1.2.3-beta"));

        let result = detect_on(&detector, page).await;
        let signatures = signatures_of(&result, "Foo");
        assert!(signatures.contains(
            &SignatureMatch::new(Channel::Js, "Foo.build")
                .with_output("v1.2.3-beta")
                .with_version(Some("-beta".to_string()))
        ));
    }

    #[tokio::test]
    async fn test_cookie_presence_only() {
        let detector = detector(r#"{"Bar": {"cookies": {"name": ""}}}"#);
        let page = FakePage::html("<html></html>").with_cookie("nameXYZ", "anything");

        let result = detect_on(&detector, page).await;
        assert_eq!(
            signatures_of(&result, "Bar"),
            vec![SignatureMatch::new(Channel::Cookies, "name")]
        );
    }

    #[tokio::test]
    async fn test_selector_error_does_not_abort_detection() {
        let detector = detector(r##"{"Foo": {"dom": ["div[", "#app"], "html": "data-foo"}}"##);
        let page = FakePage::html("<div id=\"app\" data-foo></div>")
            .with_broken_selector("div[")
            .with_elements("#app", vec![DomElement::new("")]);

        let result = detect_on(&detector, page).await;
        let signatures = signatures_of(&result, "Foo");
        assert_eq!(signatures.len(), 2);
        assert!(signatures.contains(&SignatureMatch::new(Channel::Dom, "#app")));
        assert!(signatures.contains(&SignatureMatch::new(Channel::Html, "data-foo")));
    }

    #[tokio::test]
    async fn test_inert_and_undetected_technologies_are_absent() {
        let detector = detector(r#"{"Inert": {"cats": [1]}, "jQuery": {"html": "jquery"}}"#);
        let probe = VersionProbe::script_for("jQuery").unwrap();
        // 探针只对已检测到的技术执行
        let page = FakePage::html("<html><body>plain</body></html>").with_script(&probe, json!("3.6.0"));

        let result = detect_on(&detector, page).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_broken_regex_only_fails_its_own_check() {
        let detector = detector(r#"{"Foo": {"html": ["[z-a]", "foo-app"]}}"#);
        let page = FakePage::html("<div class=\"foo-app\"></div>");

        let result = detect_on(&detector, page).await;
        assert_eq!(
            signatures_of(&result, "Foo"),
            vec![SignatureMatch::new(Channel::Html, "foo-app")]
        );
    }

    #[tokio::test]
    async fn test_script_src_version_from_template() {
        let detector = detector(r#"{"jQuery": {"scriptSrc": "jquery[.-]([\\d.]+)\\.min\\.js\\;version:\\1"}}"#);
        let page = FakePage::html(r#"<script src="/js/jquery-3.5.1.min.js"></script>"#);

        let result = detect_on(&detector, page).await;
        let report = result.into_report();
        assert_eq!(report[0].versions, vec!["3.5.1".to_string()]);
    }
}
