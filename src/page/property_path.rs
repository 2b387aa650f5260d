//! JS运行时属性路径
//! 将 `jQuery.fn.jquery` / `a b c` / `x['y-z'][0]` 解析为路径段，
//! 再生成可安全注入的取值表达式（路径段经JSON转义，不做字符串拼接）

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{WbResult, WebBaboonError};

static JS_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("静态正则必须合法")
});

/// 属性路径（至少一段）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// 由路径段直接构造
    pub fn from_segments<I, S>(segments: I) -> WbResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(WebBaboonError::InvalidInput("属性路径不能包含空段".to_string()));
        }
        Ok(Self { segments })
    }

    /// 解析规则中的变量名
    ///
    /// 含空格时按空格切分（首段为根变量），否则按 `.` 与 `[...]` 切分。
    pub fn parse(raw: &str) -> WbResult<Self> {
        let raw = raw.trim();
        if raw.contains(' ') {
            return Self::from_segments(raw.split_whitespace());
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_bracket = false;
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    } else if !after_bracket {
                        return Err(WebBaboonError::InvalidInput(format!("属性路径存在空段：{}", raw)));
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let mut inner = String::new();
                    let mut closed = false;
                    for inner_c in chars.by_ref() {
                        if inner_c == ']' {
                            closed = true;
                            break;
                        }
                        inner.push(inner_c);
                    }
                    if !closed {
                        return Err(WebBaboonError::InvalidInput(format!("属性路径括号未闭合：{}", raw)));
                    }
                    let key = strip_quotes(inner.trim());
                    if key.is_empty() {
                        return Err(WebBaboonError::InvalidInput(format!("属性路径存在空下标：{}", raw)));
                    }
                    segments.push(key.to_string());
                    after_bracket = true;
                }
                _ => {
                    current.push(c);
                    after_bracket = false;
                }
            }
        }

        if !current.is_empty() {
            segments.push(current);
        } else if raw.ends_with('.') {
            return Err(WebBaboonError::InvalidInput(format!("属性路径存在空段：{}", raw)));
        }

        Self::from_segments(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// 生成取值表达式：任一中间对象缺失或抛错时返回 null，值存在时返回 String(值)
    pub fn to_accessor_expression(&self) -> String {
        let root = &self.segments[0];
        let root_expr = if JS_IDENTIFIER.is_match(root) {
            // 合法标识符可直接引用，兼容 let/const 声明的全局变量
            format!("(typeof {root} !== 'undefined' ? {root} : undefined)")
        } else {
            format!("globalThis[{}]", json_string(root))
        };
        let rest: Vec<String> = self.segments[1..].iter().map(|s| json_string(s)).collect();

        format!(
            "(function () {{ try {{ var v = {}; var p = [{}]; \
             for (var i = 0; i < p.length; i++) {{ if (v === undefined || v === null) {{ return null; }} v = v[p[i]]; }} \
             return typeof v !== 'undefined' ? String(v) : null; }} catch (e) {{ return null; }} }})()",
            root_expr,
            rest.join(", ")
        )
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// 运行时返回值转字符串；null 视为无值
pub fn runtime_value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
