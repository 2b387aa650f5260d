//! 技术特征数据模型定义
//! 仅存储规则数据，无任何业务逻辑，支持序列化/反序列化

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// 单个技术的特征定义（从 technologies.json 解析）
///
/// 所有通道均可缺省；全部缺省的定义不会命中任何页面。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TechnologyDefinition {
    // 原始HTML正则列表
    #[serde(default, deserialize_with = "one_or_many")]
    pub html: Vec<String>,
    // meta名称 -> content正则（兼容 wappalyzergo 的数组写法）
    #[serde(default, deserialize_with = "keyed_one_or_many")]
    pub meta: HashMap<String, Vec<String>>,
    // Cookie名称正则 -> 值正则（空串表示仅判断存在）
    #[serde(default, deserialize_with = "keyed_optional")]
    pub cookies: HashMap<String, String>,
    // Header名称 -> 值正则（空串表示仅判断存在）
    #[serde(default, deserialize_with = "keyed_optional")]
    pub headers: HashMap<String, String>,
    // 出站请求URL正则
    #[serde(default, deserialize_with = "one_or_many")]
    pub network: Vec<String>,
    // DOM选择器规则
    #[serde(default)]
    pub dom: Option<DomRule>,
    // <script src> 正则
    #[serde(rename = "scriptSrc", default, deserialize_with = "one_or_many")]
    pub script_src: Vec<String>,
    // XHR请求URL正则
    #[serde(default, deserialize_with = "one_or_many")]
    pub xhr: Vec<String>,
    // JS变量路径 -> 模式（可带 `;version:` 版本指令）
    #[serde(default, deserialize_with = "keyed_optional")]
    pub js: HashMap<String, String>,
}

impl TechnologyDefinition {
    /// 是否没有任何检测通道
    pub fn is_inert(&self) -> bool {
        self.html.is_empty()
            && self.meta.is_empty()
            && self.cookies.is_empty()
            && self.headers.is_empty()
            && self.network.is_empty()
            && self.dom.as_ref().map_or(true, DomRule::is_empty)
            && self.script_src.is_empty()
            && self.xhr.is_empty()
            && self.js.is_empty()
    }
}

/// DOM规则：选择器列表（存在即命中）或 选择器 -> 条件
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DomRule {
    Selectors(Vec<String>),
    Conditions(HashMap<String, DomCondition>),
}

impl DomRule {
    pub fn is_empty(&self) -> bool {
        match self {
            DomRule::Selectors(list) => list.is_empty(),
            DomRule::Conditions(map) => map.is_empty(),
        }
    }
}

impl<'de> Deserialize<'de> for DomRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawDomRule {
            Single(String),
            Selectors(Vec<String>),
            Conditions(HashMap<String, DomCondition>),
        }

        Ok(match RawDomRule::deserialize(deserializer)? {
            RawDomRule::Single(selector) => DomRule::Selectors(vec![selector]),
            RawDomRule::Selectors(list) => DomRule::Selectors(list),
            RawDomRule::Conditions(map) => DomRule::Conditions(map),
        })
    }
}

/// DOM元素需满足的条件（全部满足才算命中）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DomCondition {
    // 属性名 -> 值正则
    #[serde(default, deserialize_with = "keyed_optional")]
    pub attributes: HashMap<String, String>,
    // 元素文本正则
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(list) => list,
        }
    }
}

// ======== 反序列化辅助：兼容字符串/数组/null 等多种写法 ========
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(raw.map(Vec::from).unwrap_or_default())
}

fn keyed_one_or_many<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<OneOrMany>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| {
            let patterns = value.map(Vec::from).unwrap_or_else(|| vec![String::new()]);
            (key, patterns)
        })
        .collect())
}

fn keyed_optional<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}

/// 技术特征库：技术名称 -> 特征定义
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TechnologyDb {
    pub technologies: HashMap<String, TechnologyDefinition>,
}

impl TechnologyDb {
    pub fn new(technologies: HashMap<String, TechnologyDefinition>) -> Self {
        Self { technologies }
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TechnologyDefinition> {
        self.technologies.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TechnologyDefinition)> {
        self.technologies.iter()
    }
}
