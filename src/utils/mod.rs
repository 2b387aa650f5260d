//! 工具模块：结果合并、Header转换、版本提取
pub mod aggregator;
pub mod header_converter;
pub mod version_extractor;

pub use self::aggregator::SignatureAggregator;
pub use self::header_converter::HeaderConverter;
pub use self::version_extractor::{VersionDirective, VersionExtractor};
