//! 结构化日志模块
//!
//! 基于 tracing 的订阅者：可热更新的 EnvFilter，终端与文件两路输出。

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt,
    layer::{Layered, SubscriberExt},
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;

type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

/// 日志管理器
///
/// 持有文件写入线程的 guard，drop 时把缓冲的日志刷到磁盘，
/// 所以应当活到进程结束。
pub struct LogManager {
    config: LoggingConfig,
    reload_handle: ReloadHandle,
    _file_guard: Option<WorkerGuard>,
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LogManager {
    /// 安装全局订阅者，每个进程只能成功一次
    pub fn init(config: LoggingConfig) -> Result<Self> {
        let filter = build_filter(&config.level, &config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let mut layers: Vec<BoxedLayer> = Vec::new();
        if config.stderr {
            layers.push(output_layer(&config, std::io::stderr, config.ansi_colors));
        }

        let mut file_guard = None;
        if let Some(path) = &config.file_path {
            let (writer, guard) = file_writer(path)?;
            layers.push(output_layer(&config, writer, false));
            file_guard = Some(guard);
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(layers)
            .try_init()
            .map_err(|e| ObservabilityError::init(e.to_string()))?;

        tracing::info!(
            target: "aura_observability",
            "Log manager initialized with level: {}",
            config.level
        );

        Ok(Self {
            config,
            reload_handle,
            _file_guard: file_guard,
        })
    }

    /// 动态更新日志级别，模块级别的指令保持不变
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let new_filter = build_filter(level, &self.config)?;
        self.reload_handle
            .reload(new_filter)
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;

        self.config.level = level.to_string();
        tracing::info!(target: "aura_observability", "Log level updated to: {}", level);
        Ok(())
    }

    /// 获取当前配置
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

/// 构建环境过滤器
fn build_filter(level: &str, config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level)
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    for (module, module_level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, module_level)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

fn output_layer<W>(config: &LoggingConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if config.json_format {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(config.include_target)
            .with_thread_ids(config.include_thread_id)
            .with_line_number(config.include_line_number)
            .with_file(true)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_target(config.include_target)
            .with_thread_ids(config.include_thread_id)
            .with_line_number(config.include_line_number)
            .with_file(true)
            .with_ansi(ansi)
            .boxed()
    }
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ObservabilityError::config(format!("Not a file path: {}", path.display())))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// 会话级 span
pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id)
}

/// 单轮对话的 span，`turn_id` 通常是用户消息的 id
pub fn turn_span(session_id: &str, turn_id: &str) -> tracing::Span {
    tracing::info_span!("turn", session_id = %session_id, turn_id = %turn_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_with_module_levels() {
        let config = LoggingConfig::default().with_module_level("aura_llm", "trace");
        let filter = build_filter("debug", &config).unwrap();

        let rendered = filter.to_string();
        assert!(rendered.contains("aura_llm=trace"));
        assert!(rendered.contains("debug"));
    }

    #[test]
    fn test_build_filter_rejects_garbage() {
        let config = LoggingConfig::default().with_module_level("aura_llm", "loud");
        assert!(build_filter("info", &config).is_err());
    }

    #[test]
    fn test_file_writer_needs_file_name() {
        assert!(matches!(
            file_writer(Path::new("/")),
            Err(ObservabilityError::Config { .. })
        ));
    }

    #[test]
    fn test_create_spans() {
        let session = session_span("chat-1");
        assert_eq!(session.metadata().unwrap().name(), "session");

        let turn = turn_span("chat-1", "user-42");
        assert_eq!(turn.metadata().unwrap().name(), "turn");
    }
}
