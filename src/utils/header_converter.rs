//! Header格式转换工具
//! 将捕获层的 HeaderMap 规范化为小写名称的单值映射

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use reqwest::header::HeaderMap;
use tracing::warn;

// 单个响应允许的最大Header条数
const MAX_HEADER_ENTRIES: usize = 1000;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// HeaderMap -> 小写名称 -> 首个非空值（只有空值时保留空串）
    pub fn to_single_value(header_map: &HeaderMap) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = HashMap::new();

        for (index, (key, value)) in header_map.iter().enumerate() {
            if index >= MAX_HEADER_ENTRIES {
                warn!("Header条数超过{}，其余已忽略", MAX_HEADER_ENTRIES);
                break;
            }

            let value = String::from_utf8_lossy(value.as_bytes()).trim().to_string();
            match map.entry(key.as_str().to_lowercase()) {
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
                Entry::Occupied(mut entry) => {
                    if entry.get().is_empty() && !value.is_empty() {
                        entry.insert(value);
                    }
                }
            }
        }

        map
    }

    /// 按名称查找Header值（名称大小写不敏感）
    pub fn get<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
        headers
            .get(name)
            .or_else(|| headers.get(&name.to_lowercase()))
            .map(String::as_str)
    }
}
