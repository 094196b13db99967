//! 日志初始化和配置模块
//!
//! 这个模块提供了统一的日志初始化功能，使用 tracing 库。
//! 默认只输出到控制台（stderr），配置了日志目录时额外写入按天滚动的日志文件。

use std::io;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// 日志配置结构体
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: Level,
    /// 日志文件目录，为 `None` 时不写文件
    pub log_dir: Option<String>,
}

impl LogConfig {
    /// 创建新的日志配置，使用默认级别
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置日志级别
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 设置日志文件目录
    pub fn log_dir<S: Into<String>>(mut self, dir: S) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::WARN, log_dir: None }
    }
}

/// 把配置文件中的级别字符串转换为 `Level`，无法识别时返回 `None`
pub fn parse_level(level: &str) -> Option<Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// 自动初始化日志系统（仅初始化一次）
static INIT_LOGGER: Once = Once::new();

/// 确保日志系统已初始化
///
/// 首次调用时初始化日志系统，后续调用不会重复初始化。
/// 如果初始化失败（比如宿主程序已经安装了 subscriber），会安静地忽略错误。
pub(crate) fn ensure_logger_initialized() {
    INIT_LOGGER.call_once(|| {
        let _ = init_default_logging();
    });
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),
}

/// 日志初始化结果
pub type LogResult<T> = Result<T, LogError>;

/// 初始化日志系统
///
/// - 控制台输出到 stderr，避免和命令行输出的 SQL 混在一起
/// - 配置了 `log_dir` 时追加按天滚动的文件输出
/// - `RUST_LOG` 环境变量优先于配置的级别
///
/// # Examples
///
/// ```no_run
/// use sqllog_inject::logging::{init_logging, LogConfig};
/// use tracing::Level;
///
/// let config = LogConfig::new().level(Level::DEBUG);
/// init_logging(config).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> LogResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(SystemTime)
        .with_target(true)
        .with_ansi(true);

    let registry = Registry::default().with(env_filter).with(console_layer);

    let result = match config.log_dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender =
                tracing_appender::rolling::daily(dir, "sqllog-inject");
            let (non_blocking, guard) =
                tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_timer(SystemTime)
                .with_target(true)
                .with_ansi(false); // 文件中不使用颜色
            let result = registry.with(file_layer).try_init();
            if result.is_ok() {
                // 存储 guard 以防止 appender 被丢弃
                std::mem::forget(guard);
            }
            result
        }
        None => registry.try_init(),
    };

    match result {
        Ok(()) => {
            tracing::debug!(
                level = %config.level,
                log_dir = ?config.log_dir,
                "日志系统初始化完成"
            );
            Ok(())
        }
        // 已经初始化过了，这不是错误
        Err(_) => Ok(()),
    }
}

/// 使用默认配置初始化日志系统
pub fn init_default_logging() -> LogResult<()> {
    init_logging(LogConfig::default())
}
