//! Aura Observability Infrastructure
//!
//! 统一的日志初始化与 span 辅助函数。

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::LoggingConfig;
pub use error::{ObservabilityError, Result};
pub use logging::{session_span, turn_span, LogManager};

/// 便捷导入模块
pub mod prelude {
    //! 常用类型的便捷导入

    pub use crate::{session_span, turn_span, LogManager, LoggingConfig, Result};

    pub use tracing::{debug, error, info, instrument, trace, warn, Instrument, Span};
}
