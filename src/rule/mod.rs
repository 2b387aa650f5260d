//! 规则模块：负责技术特征库的加载与数据模型定义
pub mod model;
pub mod loader;

// 导出核心接口
pub use self::model::{TechnologyDefinition, DomRule, DomCondition, TechnologyDb};
pub use self::loader::RuleLoader;
