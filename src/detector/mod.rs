//! 检测模块：检测结果模型与两阶段技术检测
pub mod result;
pub mod version_probe;
pub mod detector;

// 导出核心接口
pub use self::result::{Channel, DetectedTechnology, DetectionResult, SignatureMatch};
pub use self::version_probe::VersionProbe;
pub use self::detector::TechDetector;
