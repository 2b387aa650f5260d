//! 规则编译器核心
//! 将特征库中的正则字符串一次性编译为可执行模式

use std::collections::HashMap;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::pattern::{
    CompiledDomCondition, CompiledDomRule, CompiledPattern, CompiledTechnology, CompiledTechnologyDb,
    CookiePattern, HeaderPattern, JsPattern,
};
use crate::page::PropertyPath;
use crate::rule::{DomRule, TechnologyDb, TechnologyDefinition};
use crate::utils::VersionExtractor;

// 正则体积上限，防止异常规则撑爆内存
const REGEX_SIZE_LIMIT: usize = 4 * 1024 * 1024;

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译特征库
    pub fn compile(db: &TechnologyDb) -> CompiledTechnologyDb {
        let start = Instant::now();
        let mut stats = CompileStats::default();
        let mut technologies = HashMap::with_capacity(db.len());

        for (name, def) in db.iter() {
            let compiled = Self::compile_technology(name, def, &mut stats);
            technologies.insert(name.clone(), compiled);
        }

        debug!("✅ 规则编译完成，总耗时{:?}", start.elapsed());
        debug!(
            "📊 编译统计：正则{}条（无效{}条）、JS变量{}条（无效{}条）",
            stats.pattern_count, stats.broken_count, stats.js_count, stats.broken_js_count
        );

        CompiledTechnologyDb { technologies }
    }

    /// 编译单个技术规则
    pub fn compile_technology(
        name: &str,
        def: &TechnologyDefinition,
        stats: &mut CompileStats,
    ) -> CompiledTechnology {
        let mut compile = |raw: &str| Self::compile_pattern(name, raw, stats);

        let html = def.html.iter().map(|p| compile(p)).collect();
        let network = def.network.iter().map(|p| compile(p)).collect();
        let script_src = def.script_src.iter().map(|p| compile(p)).collect();
        let xhr = def.xhr.iter().map(|p| compile(p)).collect();

        let meta = def
            .meta
            .iter()
            .map(|(meta_name, patterns)| {
                (meta_name.clone(), patterns.iter().map(|p| compile(p)).collect())
            })
            .collect();

        let cookies = def
            .cookies
            .iter()
            .map(|(cookie_name, value)| CookiePattern {
                name: compile(cookie_name),
                value: Self::non_empty(value).map(|v| compile(v)),
            })
            .collect();

        let headers = def
            .headers
            .iter()
            .map(|(header_name, value)| HeaderPattern {
                name: header_name.clone(),
                value: Self::non_empty(value).map(|v| compile(v)),
            })
            .collect();

        let dom = def.dom.as_ref().map(|rule| match rule {
            DomRule::Selectors(selectors) => CompiledDomRule::Selectors(selectors.clone()),
            DomRule::Conditions(conditions) => CompiledDomRule::Conditions(
                conditions
                    .iter()
                    .map(|(selector, condition)| {
                        let compiled = CompiledDomCondition {
                            attributes: condition
                                .attributes
                                .iter()
                                .map(|(attr, pattern)| (attr.clone(), compile(pattern)))
                                .collect(),
                            text: condition.text.as_deref().map(|t| compile(t)),
                        };
                        (selector.clone(), compiled)
                    })
                    .collect(),
            ),
        });

        let js = def
            .js
            .iter()
            .map(|(variable, pattern)| Self::compile_js(name, variable, pattern, stats))
            .collect();

        CompiledTechnology {
            name: name.to_string(),
            html,
            meta,
            cookies,
            headers,
            network,
            dom,
            script_src,
            xhr,
            js,
        }
    }

    /// 编译JS变量规则
    fn compile_js(tech_name: &str, variable: &str, pattern: &str, stats: &mut CompileStats) -> JsPattern {
        stats.js_count += 1;
        let path = match PropertyPath::parse(variable) {
            Ok(path) => Some(path),
            Err(e) => {
                stats.broken_js_count += 1;
                warn!("技术 [{}] 的JS变量 {} 无法解析，已忽略：{}", tech_name, variable, e);
                None
            }
        };

        JsPattern {
            variable: variable.to_string(),
            path,
            directive: VersionExtractor::parse_directive(pattern),
        }
    }

    /// 编译单个正则模式（失败时尝试修复后重编译）
    pub fn compile_pattern(tech_name: &str, raw: &str, stats: &mut CompileStats) -> CompiledPattern {
        stats.pattern_count += 1;
        let (body, version_template) = Self::split_tags(raw);

        let regex = match Self::build_regex(&body) {
            Ok(regex) => Some(regex),
            Err(first_err) => {
                let repaired = Self::repair_pattern(&body);
                match Self::build_regex(&repaired) {
                    Ok(regex) => {
                        debug!("技术 [{}] 正则修复后编译成功：{} -> {}", tech_name, body, repaired);
                        Some(regex)
                    }
                    Err(_) => {
                        stats.broken_count += 1;
                        warn!("技术 [{}] 正则无效，该检查将不会命中：{}（{}）", tech_name, raw, first_err);
                        None
                    }
                }
            }
        };

        CompiledPattern {
            raw: raw.to_string(),
            regex,
            version_template,
        }
    }

    fn build_regex(pattern: &str) -> Result<Regex, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
    }

    /// 拆分 `pattern\;version:\1\;confidence:50` 形式的标签
    fn split_tags(raw: &str) -> (String, Option<String>) {
        let mut segments = raw.split(';');
        let mut body = segments.next().unwrap_or_default().to_string();
        let mut version_template = None;
        let mut is_tag_tail = false;

        for segment in segments {
            if let Some(template) = segment.strip_prefix("version:") {
                version_template = Some(Self::strip_trailing_escape(template).to_string());
                is_tag_tail = true;
            } else if segment.starts_with("confidence:") {
                is_tag_tail = true;
            } else if !is_tag_tail {
                // 非标签分号属于正则本身
                body.push(';');
                body.push_str(segment);
            }
        }

        if is_tag_tail {
            body = Self::strip_trailing_escape(&body).to_string();
        }

        (body, version_template.filter(|t| !t.trim().is_empty()))
    }

    /// 去掉标签前用于转义分号的单个反斜杠
    fn strip_trailing_escape(s: &str) -> &str {
        let trailing = s.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            &s[..s.len() - 1]
        } else {
            s
        }
    }

    /// 修复常见的不兼容写法
    fn repair_pattern(pattern: &str) -> String {
        static LOOK_AROUND_REGEX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\(\?<?[=!][^)]*\)").expect("静态正则必须合法")
        });

        let mut cleaned = pattern.to_string();

        // 移除PCRE分隔符
        if cleaned.len() > 1 && cleaned.starts_with('/') && cleaned.ends_with('/') {
            cleaned = cleaned[1..cleaned.len() - 1].to_string();
        }

        // 移除环视语法
        cleaned = LOOK_AROUND_REGEX.replace_all(&cleaned, "").to_string();

        // 末尾悬空的反斜杠补成字面量反斜杠
        if cleaned.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1 {
            cleaned.push('\\');
        }

        Self::fix_unbalanced_groups(&cleaned)
    }

    /// 丢弃多余的右括号，并移除末尾未闭合的左括号
    fn fix_unbalanced_groups(s: &str) -> String {
        let mut result: Vec<char> = Vec::with_capacity(s.len());
        let mut open_positions = Vec::new();
        let mut escaped = false;
        let mut in_class = false;

        for c in s.chars() {
            if escaped {
                escaped = false;
                result.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    result.push(c);
                }
                '[' if !in_class => {
                    in_class = true;
                    result.push(c);
                }
                ']' if in_class => {
                    in_class = false;
                    result.push(c);
                }
                '(' if !in_class => {
                    open_positions.push(result.len());
                    result.push(c);
                }
                ')' if !in_class => {
                    if open_positions.pop().is_some() {
                        result.push(c);
                    }
                }
                _ => result.push(c),
            }
        }

        for pos in open_positions.into_iter().rev() {
            result.remove(pos);
        }

        result.into_iter().collect()
    }

    fn non_empty(value: &str) -> Option<&str> {
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
pub struct CompileStats {
    pub pattern_count: usize,
    pub broken_count: usize,
    pub js_count: usize,
    pub broken_js_count: usize,
}
