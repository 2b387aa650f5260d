//! 编译模块：将特征库中的正则字符串编译为可执行模式
pub mod pattern;
pub mod compiler;

pub use self::pattern::{
    CompiledDomCondition, CompiledDomRule, CompiledPattern, CompiledTechnology, CompiledTechnologyDb,
    CookiePattern, HeaderPattern, JsPattern,
};
pub use self::compiler::{CompileStats, RuleCompiler};
