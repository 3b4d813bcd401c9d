//! 日志初始化模块
//!
//! 使用 tracing-subscriber 输出到 stderr（stdout 留给报告），
//! 可选地通过 tracing-appender 按天滚动写入日志目录。

use crate::config;
use std::path::PathBuf;
use std::sync::Once;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
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
    /// 滚动日志目录，`None` 时只输出到 stderr
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置日志级别
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 设置日志目录
    pub fn log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::INFO, log_dir: None }
    }
}

impl From<&config::LogConfig> for LogConfig {
    fn from(config: &config::LogConfig) -> Self {
        Self {
            // 级别名已在 Config::validate 中检查
            level: config.level.parse().unwrap_or(Level::INFO),
            log_dir: config.log_dir.as_ref().map(PathBuf::from),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("日志初始化错误: {0}")]
    Init(String),
}

/// 日志初始化结果
pub type LogResult<T> = Result<T, LogError>;

static INIT_LOGGER: Once = Once::new();

/// 初始化日志系统
///
/// 只有首次调用会安装全局订阅者，之后的调用直接返回 `Ok(None)`。
/// 配置了日志目录时返回文件写入线程的 guard，调用方需要持有到程序结束。
///
/// # Examples
///
/// ```no_run
/// use genlog_analysis::logging::{LogConfig, init_logging};
/// use tracing::Level;
///
/// let _guard = init_logging(LogConfig::new().level(Level::DEBUG)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> LogResult<Option<WorkerGuard>> {
    let mut result = Ok(None);
    INIT_LOGGER.call_once(|| {
        result = install(&config);
    });
    result
}

fn install(config: &LogConfig) -> LogResult<Option<WorkerGuard>> {
    // RUST_LOG 优先于配置的级别
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(SystemTime)
        .with_target(false);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "genlog");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(SystemTime)
                .with_target(true)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LogError::Init(e.to_string()))?;

    tracing::debug!(level = %config.level, log_dir = ?config.log_dir, "日志系统初始化完成");
    Ok(guard)
}
