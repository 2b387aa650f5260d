//! 技术特征库加载器
//! 负责从本地JSON文件/字符串解析特征库

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::model::{TechnologyDb, TechnologyDefinition};
use crate::error::{WbResult, WebBaboonError};

// 兼容的外层包装字段（wappalyzergo 使用 apps）
const WRAPPER_KEYS: [&str; 2] = ["apps", "technologies"];

/// 特征库加载器
pub struct RuleLoader;

impl RuleLoader {
    /// 从本地文件加载特征库
    pub async fn load_file(path: impl AsRef<Path>) -> WbResult<TechnologyDb> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            WebBaboonError::RuleLoadError(format!("读取特征库文件 {} 失败：{}", path.display(), e))
        })?;

        let db = Self::from_json_str(&content)?;
        debug!("从 {} 加载特征库成功，技术总数：{}", path.display(), db.len());
        Ok(db)
    }

    /// 从JSON字符串解析特征库
    ///
    /// 单个技术定义格式错误时跳过该技术并告警，不影响其余技术。
    pub fn from_json_str(json: &str) -> WbResult<TechnologyDb> {
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(root) = root else {
            return Err(WebBaboonError::RuleParseError("特征库顶层必须是JSON对象".to_string()));
        };

        let entries = Self::unwrap_container(root);
        let mut technologies = HashMap::with_capacity(entries.len());
        let mut inert_count = 0;

        for (name, raw_def) in entries {
            match serde_json::from_value::<TechnologyDefinition>(raw_def) {
                Ok(def) => {
                    if def.is_inert() {
                        inert_count += 1;
                    }
                    technologies.insert(name, def);
                }
                Err(e) => warn!("技术 [{}] 定义解析失败，已跳过：{}", name, e),
            }
        }

        debug!("特征库解析完成，技术总数：{}，无检测通道的技术：{}", technologies.len(), inert_count);
        Ok(TechnologyDb::new(technologies))
    }

    /// 剥离 {"apps": {...}} 一类的外层包装
    fn unwrap_container(mut root: Map<String, Value>) -> Map<String, Value> {
        for key in WRAPPER_KEYS {
            let is_container = matches!(
                root.get(key),
                Some(Value::Object(inner)) if !inner.is_empty() && inner.values().all(Value::is_object)
            );
            if is_container {
                if let Some(Value::Object(inner)) = root.remove(key) {
                    return inner;
                }
            }
        }
        root
    }
}
