//! DOM通道：CSS选择器查询（存在性 / 属性与文本条件）

use tracing::warn;

use super::matched;
use crate::compiler::{CompiledDomCondition, CompiledDomRule, CompiledTechnology};
use crate::detector::{Channel, SignatureMatch};
use crate::page::{DomElement, PageSnapshot};

/// DOM分析器
pub struct DomAnalyzer;

impl DomAnalyzer {
    pub const CHANNEL: Channel = Channel::Dom;

    /// 执行DOM检查；单个选择器查询失败只影响该选择器
    pub async fn check(tech: &CompiledTechnology, snapshot: &PageSnapshot<'_>) -> Vec<SignatureMatch> {
        let Some(rule) = &tech.dom else {
            return Vec::new();
        };
        let runtime = snapshot.runtime();
        let mut signatures = Vec::new();

        match rule {
            CompiledDomRule::Selectors(selectors) => {
                for selector in selectors {
                    match runtime.query_elements(selector).await {
                        Ok(elements) if !elements.is_empty() => {
                            signatures.push(matched(Self::CHANNEL, &tech.name, selector.clone(), None));
                        }
                        Ok(_) => {}
                        Err(e) => warn!("技术 [{}] DOM选择器 {} 查询失败：{}", tech.name, selector, e),
                    }
                }
            }
            CompiledDomRule::Conditions(conditions) => {
                for (selector, condition) in conditions {
                    let elements = match runtime.query_elements(selector).await {
                        Ok(elements) => elements,
                        Err(e) => {
                            warn!("技术 [{}] DOM选择器 {} 查询失败：{}", tech.name, selector, e);
                            continue;
                        }
                    };
                    // 首个满足条件的元素即命中
                    if elements.iter().any(|element| Self::satisfies(element, condition)) {
                        let detail = format!("{} with conditions", selector);
                        signatures.push(matched(Self::CHANNEL, &tech.name, detail, None));
                    }
                }
            }
        }

        signatures
    }

    /// 元素是否满足全部属性与文本条件
    pub fn satisfies(element: &DomElement, condition: &CompiledDomCondition) -> bool {
        let attributes_ok = condition.attributes.iter().all(|(attr, pattern)| {
            element
                .attribute(attr)
                .is_some_and(|value| !value.is_empty() && pattern.is_match(value))
        });
        if !attributes_ok {
            return false;
        }

        condition
            .text
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(element.text()))
    }
}
