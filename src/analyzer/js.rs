//! JS运行时通道
//! 检测阶段只判断变量是否存在；版本阶段读取变量值并按 `;version:` 指令提取版本

use super::matched;
use crate::compiler::CompiledTechnology;
use crate::detector::{Channel, SignatureMatch};
use crate::page::PageSnapshot;

/// JS分析器
pub struct JsAnalyzer;

impl JsAnalyzer {
    pub const CHANNEL: Channel = Channel::Js;

    /// 检测阶段：变量已定义即命中，不比较取值
    pub async fn detect(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        let runtime = snapshot.runtime();
        let mut signatures = Vec::new();

        for js in &tech.js {
            let Some(path) = &js.path else {
                continue;
            };
            if runtime.read_property(path).await.is_some() {
                signatures.push(matched(Self::CHANNEL, &tech.name, js.variable.clone(), None));
            }
        }

        signatures
    }

    /// 版本阶段：记录取值，并尝试按版本指令提取版本
    pub async fn extract_versions(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        let runtime = snapshot.runtime();
        let mut signatures = Vec::new();

        for js in &tech.js {
            let Some(path) = &js.path else {
                continue;
            };
            let Some(value) = runtime.read_property(path).await else {
                continue;
            };

            let version = js.directive.as_ref().and_then(|directive| directive.extract(&value));
            let signature = matched(Self::CHANNEL, &tech.name, js.variable.clone(), version).with_output(value);
            signatures.push(signature);
        }

        signatures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::testing::{open, technology};
    use crate::page::fake::FakePage;
    use serde_json::json;

    #[tokio::test]
    async fn test_undefined_variable_is_no_match() {
        let tech = technology(r#"{"js": {"Foo.version": ""}}"#);
        let (service, url) = open(FakePage::html("")).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();

        assert!(JsAnalyzer::detect(&tech, &snapshot).await.is_empty());
        assert!(JsAnalyzer::extract_versions(&tech, &snapshot).await.is_empty());
    }

    #[tokio::test]
    async fn test_detect_is_presence_only() {
        let tech = technology(r#"{"js": {"Foo.version": "^9"}}"#);
        let (service, url) = open(FakePage::html("").with_js("Foo.version", json!("1.0"))).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();

        assert_eq!(
            JsAnalyzer::detect(&tech, &snapshot).await,
            vec![SignatureMatch::new(Channel::Js, "Foo.version")]
        );
    }

    #[tokio::test]
    async fn test_missing_literal_keeps_output_without_version() {
        let tech = technology(r#"{"js": {"Foo.build": "release-;version:\\1"}}"#);
        let (service, url) = open(FakePage::html("").with_js("Foo.build", json!("nightly"))).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();

        assert_eq!(
            JsAnalyzer::extract_versions(&tech, &snapshot).await,
            vec![SignatureMatch::new(Channel::Js, "Foo.build").with_output("nightly")]
        );
    }
}
