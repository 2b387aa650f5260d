//! 传输层通道：Cookie、响应头、网络请求、XHR

use super::{first_match, matched, Analyzer};
use crate::compiler::CompiledTechnology;
use crate::detector::{Channel, SignatureMatch};
use crate::page::PageSnapshot;
use crate::utils::HeaderConverter;

/// Cookie分析器：名称正则匹配，值正则非空时还需匹配值
pub struct CookieAnalyzer;

impl Analyzer for CookieAnalyzer {
    const CHANNEL: Channel = Channel::Cookies;

    fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        let mut signatures = Vec::new();

        for rule in &tech.cookies {
            for cookie in &snapshot.cookies {
                if !rule.name.is_match(&cookie.name) {
                    continue;
                }
                let version = match &rule.value {
                    None => rule.name.match_version(&cookie.name).flatten(),
                    Some(value_pattern) => match value_pattern.match_version(&cookie.value) {
                        Some(version) => version,
                        None => continue,
                    },
                };
                signatures.push(matched(Self::CHANNEL, &tech.name, rule.name.raw.clone(), version));
            }
        }

        signatures
    }
}

/// Header分析器：名称精确查找，值为空时仅判断存在
pub struct HeaderAnalyzer;

impl Analyzer for HeaderAnalyzer {
    const CHANNEL: Channel = Channel::Headers;

    fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        let mut signatures = Vec::new();

        for rule in &tech.headers {
            let Some(header_value) = HeaderConverter::get(&snapshot.headers, &rule.name) else {
                continue;
            };

            let (raw_value, version) = match &rule.value {
                None => ("", None),
                Some(pattern) => match pattern.match_version(header_value) {
                    Some(version) => (pattern.raw.as_str(), version),
                    None => continue,
                },
            };
            let detail = format!("{}: {}", rule.name, raw_value);
            signatures.push(matched(Self::CHANNEL, &tech.name, detail, version));
        }

        signatures
    }
}

/// 网络请求分析器：匹配所有出站请求URL
pub struct NetworkAnalyzer;

impl Analyzer for NetworkAnalyzer {
    const CHANNEL: Channel = Channel::Network;

    fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        let mut signatures = Vec::new();

        for pattern in &tech.network {
            for url in snapshot.request_urls() {
                if let Some(version) = pattern.match_version(url) {
                    signatures.push(matched(Self::CHANNEL, &tech.name, pattern.raw.clone(), version));
                }
            }
        }

        signatures
    }
}

/// XHR分析器：仅匹配标记为XHR的请求，每个模式取首个命中
pub struct XhrAnalyzer;

impl Analyzer for XhrAnalyzer {
    const CHANNEL: Channel = Channel::Xhr;

    fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        tech.xhr
            .iter()
            .filter_map(|pattern| {
                let version = first_match(pattern, snapshot.xhr_urls())?;
                Some(matched(Self::CHANNEL, &tech.name, pattern.raw.clone(), version))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::testing::{open, technology, PAGE_URL};
    use crate::page::fake::{FakePage, FakeService};
    use reqwest::header::{HeaderMap, HeaderValue};
    use url::Url;

    #[tokio::test]
    async fn test_cookie_value_pattern_must_match() {
        let tech = technology(r#"{"cookies": {"foo_sess": "^abc"}}"#);

        let (service, url) = open(FakePage::html("").with_cookie("foo_sess", "xyz")).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();
        assert!(CookieAnalyzer::check(&tech, &snapshot).is_empty());

        let (service, url) = open(FakePage::html("").with_cookie("FOO_SESS", "abc123")).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();
        assert_eq!(
            CookieAnalyzer::check(&tech, &snapshot),
            vec![SignatureMatch::new(Channel::Cookies, "foo_sess")]
        );
    }

    #[tokio::test]
    async fn test_header_value_mismatch_is_no_match() {
        let tech = technology(r#"{"headers": {"Server": "nginx"}}"#);
        let (service, url) = open(FakePage::html("").with_header("Server", "Apache/2.4")).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();
        assert!(HeaderAnalyzer::check(&tech, &snapshot).is_empty());
    }

    #[tokio::test]
    async fn test_header_version_from_template() {
        let tech = technology(r#"{"headers": {"Server": "nginx(?:/([\\d.]+))?\\;version:\\1"}}"#);
        let (service, url) = open(FakePage::html("").with_header("Server", "nginx/1.25.3")).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();

        let signatures = HeaderAnalyzer::check(&tech, &snapshot);
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0].version.as_deref(), Some("1.25.3"));
    }

    #[test]
    fn test_present_but_empty_header_matches_presence_rule() {
        let tech = technology(r#"{"headers": {"X-Foo": ""}}"#);
        let mut raw = HeaderMap::new();
        raw.insert("X-Foo", HeaderValue::from_static(""));

        let runtime = FakeService::new();
        let snapshot = PageSnapshot::new(Url::parse(PAGE_URL).unwrap(), "", &runtime)
            .with_headers(HeaderConverter::to_single_value(&raw));

        assert_eq!(
            HeaderAnalyzer::check(&tech, &snapshot),
            vec![SignatureMatch::new(Channel::Headers, "X-Foo: ")]
        );
    }

    #[tokio::test]
    async fn test_network_matches_any_request() {
        let tech = technology(r#"{"network": "cdn\\.foo\\.com/lib-([\\d.]+)\\.js\\;version:\\1"}"#);
        let page = FakePage::html("")
            .with_request("https://site.example/", false)
            .with_request("https://cdn.foo.com/lib-2.0.js", false);
        let (service, url) = open(page).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();

        let signatures = NetworkAnalyzer::check(&tech, &snapshot);
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0].channel, Channel::Network);
        assert_eq!(signatures[0].version.as_deref(), Some("2.0"));
    }

    #[tokio::test]
    async fn test_xhr_ignores_requests_not_flagged_as_xhr() {
        let tech = technology(r#"{"xhr": "api\\.foo\\.com"}"#);

        let (service, url) = open(FakePage::html("").with_request("https://api.foo.com/v1", false)).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();
        assert!(XhrAnalyzer::check(&tech, &snapshot).is_empty());

        let page = FakePage::html("")
            .with_request("https://api.foo.com/v1", true)
            .with_request("https://api.foo.com/v2", true);
        let (service, url) = open(page).await;
        let snapshot = PageSnapshot::capture(&service, &url).await.unwrap();
        assert_eq!(
            XhrAnalyzer::check(&tech, &snapshot),
            vec![SignatureMatch::new(Channel::Xhr, "api\\.foo\\.com")]
        );
    }
}
