//! 版本提取工具模块
//! 1. 正则通道：根据 `\1` / `$1` 版本模板从捕获分组拼出版本号
//! 2. JS通道：解析 `字面量;version:...` 指令，在运行时取值中定位字面量并截取其后的内容

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// 版本指令分隔符
const VERSION_SEPARATOR: &str = ";version:";

// 版本模板中的分组占位符（\1 / $1）
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\$]\d").expect("静态正则必须合法"));

/// 版本提取工具类
pub struct VersionExtractor;

impl VersionExtractor {
    /// 从正则捕获结果中提取版本号
    ///
    /// 模板中的 `\N` 与 `$N` 均替换为第N个分组的内容（缺失分组替换为空）。
    /// 不含占位符的模板按字面版本返回；
    /// 没有任何分组被替换、结果为空或残留占位符时返回 `None`。
    pub fn extract(version_template: &Option<String>, captures: &Captures) -> Option<String> {
        let template = version_template.as_deref()?.trim();
        if template.is_empty() {
            return None;
        }
        if !PLACEHOLDER_REGEX.is_match(template) {
            return Some(template.to_string());
        }

        let mut version = template.to_string();
        let mut replaced = false;

        // 倒序替换，避免 \1 误伤 \10
        for group_index in (1..captures.len()).rev() {
            let value = match captures.get(group_index) {
                Some(matched) => {
                    replaced = true;
                    matched.as_str().trim()
                }
                None => "",
            };
            version = version
                .replace(&format!("\\{}", group_index), value)
                .replace(&format!("${}", group_index), value);
        }

        let version = version.trim().to_string();
        if !replaced || version.is_empty() || version.contains('\\') || version.contains('$') {
            return None;
        }
        Some(version)
    }

    /// 解析JS模式中的 `;version:` 指令，不含指令时返回 `None`
    pub fn parse_directive(pattern: &str) -> Option<VersionDirective> {
        let (literal, marker) = pattern.split_once(VERSION_SEPARATOR)?;
        VersionDirective::new(literal, marker)
    }
}

/// JS版本指令：字面量按原样转义后定位，其后的内容作为版本捕获组
#[derive(Debug, Clone)]
pub struct VersionDirective {
    pub literal: String,
    pub marker: String,
    regex: Regex,
}

impl VersionDirective {
    pub fn new(literal: &str, marker: &str) -> Option<Self> {
        let regex = Regex::new(&format!("{}(.+)", regex::escape(literal))).ok()?;
        Some(Self {
            literal: literal.to_string(),
            marker: marker.to_string(),
            regex,
        })
    }

    /// 在运行时取值中提取版本
    pub fn extract(&self, value: &str) -> Option<String> {
        self.regex
            .captures(value)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|v| !v.is_empty())
    }
}
