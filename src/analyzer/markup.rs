//! 页面标记类通道：原始HTML、meta标签、script-src

use super::{first_match, matched, Analyzer};
use crate::compiler::CompiledTechnology;
use crate::detector::{Channel, SignatureMatch};
use crate::page::PageSnapshot;

/// HTML分析器：正则搜索整页HTML
pub struct HtmlAnalyzer;

impl Analyzer for HtmlAnalyzer {
    const CHANNEL: Channel = Channel::Html;

    fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        tech.html
            .iter()
            .filter_map(|pattern| {
                let version = pattern.match_version(&snapshot.html)?;
                Some(matched(Self::CHANNEL, &tech.name, pattern.raw.clone(), version))
            })
            .collect()
    }
}

/// Meta分析器：按名称（大小写不敏感）匹配 content
pub struct MetaAnalyzer;

impl Analyzer for MetaAnalyzer {
    const CHANNEL: Channel = Channel::Meta;

    fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        let mut signatures = Vec::new();

        for (meta_name, patterns) in &tech.meta {
            let wanted = meta_name.to_lowercase();
            let contents: Vec<&str> = snapshot
                .meta_tags
                .iter()
                .filter(|(name, _)| *name == wanted)
                .map(|(_, content)| content.as_str())
                .collect();
            if contents.is_empty() {
                continue;
            }

            for pattern in patterns {
                if let Some(version) = first_match(pattern, contents.iter().copied()) {
                    let detail = format!("{}: {}", meta_name, pattern.raw);
                    signatures.push(matched(Self::CHANNEL, &tech.name, detail, version));
                }
            }
        }

        signatures
    }
}

/// Script分析器：匹配 `<script src>`，每个模式取首个命中
pub struct ScriptSrcAnalyzer;

impl Analyzer for ScriptSrcAnalyzer {
    const CHANNEL: Channel = Channel::ScriptSrc;

    fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        tech.script_src
            .iter()
            .filter_map(|pattern| {
                let version = first_match(pattern, snapshot.script_srcs.iter().map(String::as_str))?;
                Some(matched(Self::CHANNEL, &tech.name, pattern.raw.clone(), version))
            })
            .collect()
    }
}
