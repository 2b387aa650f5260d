//! 页面模块：页面执行服务接口、页面快照、JS属性路径与内置后端
pub mod property_path;
pub mod service;
pub mod snapshot;
#[cfg(feature = "http-backend")]
pub mod http_service;
#[cfg(test)]
pub(crate) mod fake;

pub use self::property_path::{runtime_value_to_string, PropertyPath};
pub use self::service::{PageExecutionService, PageRuntime};
pub use self::snapshot::{Cookie, DomElement, ObservedRequest, PageSnapshot};
#[cfg(feature = "http-backend")]
pub use self::http_service::StaticHttpService;
