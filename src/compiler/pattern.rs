//! 编译后模式模型
//! 正则编译后的结构

use std::collections::HashMap;

use regex::{Captures, Regex};

use crate::page::PropertyPath;
use crate::utils::{VersionDirective, VersionExtractor};

/// 编译后的正则模式
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    // 规则中书写的原始模式（用作命中详情）
    pub raw: String,
    // None 表示正则无效，该模式永不命中
    pub regex: Option<Regex>,
    // `;version:` 之后的版本模板（\1 / $1）
    pub version_template: Option<String>,
}

impl CompiledPattern {
    /// 正则是否编译失败
    pub fn is_broken(&self) -> bool {
        self.regex.is_none()
    }

    /// 匹配输入，返回捕获结果
    pub fn captures<'a>(&self, input: &'a str) -> Option<Captures<'a>> {
        self.regex.as_ref().and_then(|regex| regex.captures(input))
    }

    /// 简单匹配判断
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.as_ref().is_some_and(|regex| regex.is_match(input))
    }

    /// 匹配并按版本模板提取版本：外层 None 表示未命中
    pub fn match_version(&self, input: &str) -> Option<Option<String>> {
        let captures = self.captures(input)?;
        Some(VersionExtractor::extract(&self.version_template, &captures))
    }
}

/// Cookie规则：名称正则 + 可选值正则
#[derive(Debug, Clone)]
pub struct CookiePattern {
    pub name: CompiledPattern,
    // None 表示仅判断存在
    pub value: Option<CompiledPattern>,
}

/// Header规则：精确名称 + 可选值正则
#[derive(Debug, Clone)]
pub struct HeaderPattern {
    pub name: String,
    pub value: Option<CompiledPattern>,
}

/// DOM条件（编译后）
#[derive(Debug, Clone, Default)]
pub struct CompiledDomCondition {
    pub attributes: Vec<(String, CompiledPattern)>,
    pub text: Option<CompiledPattern>,
}

/// DOM规则（编译后）
#[derive(Debug, Clone)]
pub enum CompiledDomRule {
    Selectors(Vec<String>),
    Conditions(Vec<(String, CompiledDomCondition)>),
}

/// JS变量规则
#[derive(Debug, Clone)]
pub struct JsPattern {
    // 规则中书写的变量名
    pub variable: String,
    // 解析后的属性路径；None 表示变量名无法解析
    pub path: Option<PropertyPath>,
    // `;version:` 版本指令
    pub directive: Option<VersionDirective>,
}

/// 技术编译后的规则
#[derive(Debug, Clone, Default)]
pub struct CompiledTechnology {
    pub name: String,
    pub html: Vec<CompiledPattern>,
    pub meta: Vec<(String, Vec<CompiledPattern>)>,
    pub cookies: Vec<CookiePattern>,
    pub headers: Vec<HeaderPattern>,
    pub network: Vec<CompiledPattern>,
    pub dom: Option<CompiledDomRule>,
    pub script_src: Vec<CompiledPattern>,
    pub xhr: Vec<CompiledPattern>,
    pub js: Vec<JsPattern>,
}

/// 编译后的特征库
#[derive(Debug, Clone, Default)]
pub struct CompiledTechnologyDb {
    pub technologies: HashMap<String, CompiledTechnology>,
}

impl CompiledTechnologyDb {
    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CompiledTechnology> {
        self.technologies.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledTechnology> {
        self.technologies.values()
    }
}
