//! 检测结果模型：命中特征、单页检测结果与导出结构

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// 特征通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "html")]
    Html,
    #[serde(rename = "meta")]
    Meta,
    #[serde(rename = "cookies")]
    Cookies,
    #[serde(rename = "headers")]
    Headers,
    #[serde(rename = "network")]
    Network,
    #[serde(rename = "dom")]
    Dom,
    #[serde(rename = "scriptSrc")]
    ScriptSrc,
    #[serde(rename = "xhr")]
    Xhr,
    #[serde(rename = "js")]
    Js,
    // 专用版本探针，仅出现在版本提取阶段
    #[serde(rename = "js_version")]
    JsVersion,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Html => "html",
            Channel::Meta => "meta",
            Channel::Cookies => "cookies",
            Channel::Headers => "headers",
            Channel::Network => "network",
            Channel::Dom => "dom",
            Channel::ScriptSrc => "scriptSrc",
            Channel::Xhr => "xhr",
            Channel::Js => "js",
            Channel::JsVersion => "js_version",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条命中特征；所有字段相等即视为同一特征
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignatureMatch {
    #[serde(rename = "type")]
    pub channel: Channel,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl SignatureMatch {
    pub fn new(channel: Channel, detail: impl Into<String>) -> Self {
        Self {
            channel,
            detail: detail.into(),
            output: None,
            version: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }
}

/// 检测结果：技术名称 -> 命中特征集合（集合语义，重复特征自动合并）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionResult {
    pub(crate) technologies: HashMap<String, HashSet<SignatureMatch>>,
}

impl DetectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条特征
    pub fn insert(&mut self, tech_name: &str, signature: SignatureMatch) {
        self.technologies
            .entry(tech_name.to_string())
            .or_default()
            .insert(signature);
    }

    /// 批量记录特征；空集合不会产生条目
    pub fn extend<I>(&mut self, tech_name: &str, signatures: I)
    where
        I: IntoIterator<Item = SignatureMatch>,
    {
        let mut signatures = signatures.into_iter().peekable();
        if signatures.peek().is_none() {
            return;
        }
        self.technologies
            .entry(tech_name.to_string())
            .or_default()
            .extend(signatures);
    }

    pub fn get(&self, tech_name: &str) -> Option<&HashSet<SignatureMatch>> {
        self.technologies.get(tech_name)
    }

    pub fn contains(&self, tech_name: &str) -> bool {
        self.technologies.contains_key(tech_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.technologies.keys()
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<SignatureMatch>)> {
        self.technologies.iter()
    }

    /// 转换为按名称排序的导出结构
    pub fn into_report(self) -> Vec<DetectedTechnology> {
        let mut report: Vec<DetectedTechnology> = self
            .technologies
            .into_iter()
            .map(|(name, signatures)| DetectedTechnology::new(name, signatures))
            .collect();
        report.sort_by(|a, b| a.name.cmp(&b.name));
        report
    }
}

/// 导出用的技术检测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedTechnology {
    pub name: String,
    // 所有特征中出现过的版本（去重、排序）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
    pub signatures: Vec<SignatureMatch>,
}

impl DetectedTechnology {
    pub fn new(name: String, signatures: HashSet<SignatureMatch>) -> Self {
        let signatures: BTreeSet<SignatureMatch> = signatures.into_iter().collect();
        let versions: BTreeSet<String> = signatures
            .iter()
            .filter_map(|sig| sig.version.clone())
            .collect();

        Self {
            name,
            versions: versions.into_iter().collect(),
            signatures: signatures.into_iter().collect(),
        }
    }
}

// ======== 报告输出：技术一行，特征逐行缩进 ========
impl fmt::Display for DetectedTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {}", self.name)?;
        if !self.versions.is_empty() {
            write!(f, " (version: {})", self.versions.join(", "))?;
        }
        for sig in &self.signatures {
            write!(f, "\n  {}: {}", sig.channel, sig.detail)?;
            if let Some(output) = &sig.output {
                if sig.channel != Channel::JsVersion {
                    write!(f, " (output: {})", output)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_signatures_collapse() {
        let mut result = DetectionResult::new();
        result.insert("Foo", SignatureMatch::new(Channel::Html, "foo"));
        result.insert("Foo", SignatureMatch::new(Channel::Html, "foo"));
        result.insert("Foo", SignatureMatch::new(Channel::Html, "foo").with_output("x"));
        assert_eq!(result.get("Foo").unwrap().len(), 2);
    }

    #[test]
    fn test_extend_with_nothing_creates_no_entry() {
        let mut result = DetectionResult::new();
        result.extend("Foo", Vec::new());
        assert!(!result.contains("Foo"));
    }

    #[test]
    fn test_report_display() {
        let mut result = DetectionResult::new();
        result.insert("jQuery", SignatureMatch::new(Channel::Js, "jQuery.fn.jquery"));
        result.insert(
            "jQuery",
            SignatureMatch::new(Channel::Js, "jQuery.fn.jquery").with_output("3.6.0"),
        );
        result.insert(
            "jQuery",
            SignatureMatch::new(Channel::JsVersion, "Version check: jQuery")
                .with_output("3.6.0")
                .with_version(Some("3.6.0".to_string())),
        );

        let report = result.into_report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].versions, vec!["3.6.0".to_string()]);
        assert_eq!(
            report[0].to_string(),
            "- jQuery (version: 3.6.0)\n  js: jQuery.fn.jquery\n  js: jQuery.fn.jquery (output: 3.6.0)\n  js_version: Version check: jQuery"
        );
    }

    #[test]
    fn test_signature_serializes_with_type_field() {
        let sig = SignatureMatch::new(Channel::ScriptSrc, "foo\\.js");
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json, serde_json::json!({"type": "scriptSrc", "detail": "foo\\.js"}));
    }
}
