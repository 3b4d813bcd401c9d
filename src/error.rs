//! 错误类型定义
//!
//! 这个模块定义了库中使用的所有错误类型，使用 thiserror 提供丰富的错误信息。
//! 可恢复的数据质量问题（未知连接、无法识别的行等）不走这里，而是作为
//! [`crate::diagnostics::Diagnostic`] 报告；这里只保留会中断运行的错误。

/// 分析器的结果类型
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// 分析器错误类型
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 正则表达式错误
    #[error("正则表达式错误: {0}")]
    Regex(#[from] regex::Error),

    /// TOML 配置解析错误
    #[error("配置文件解析错误: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML 配置序列化错误
    #[error("配置文件序列化错误: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// breakoff 日期无法解析
    #[error("无效的 breakoff 日期 '{value}': {source}")]
    Breakoff {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 解析器内部状态不一致，运行立即终止
    #[error("内部状态不一致 (行{line}): {detail}")]
    Invariant { line: usize, detail: String },
}

impl AnalyzerError {
    /// 创建一个内部状态不一致错误
    pub fn invariant<S: Into<String>>(line: usize, detail: S) -> Self {
        let detail = detail.into();
        tracing::error!(line, "内部状态不一致: {}", detail);
        Self::Invariant { line, detail }
    }

    /// 创建一个配置错误
    pub fn config<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        tracing::error!("配置错误: {}", message);
        Self::Config(message)
    }

    /// 创建一个 breakoff 日期错误
    pub fn breakoff<S: Into<String>>(
        value: S,
        source: chrono::ParseError,
    ) -> Self {
        let value = value.into();
        tracing::error!("无效的 breakoff 日期: {}", value);
        Self::Breakoff { value, source }
    }

    /// 检查是否为 IO 错误
    pub fn is_io_error(&self) -> bool {
        matches!(self, AnalyzerError::Io(_))
    }

    /// 检查是否为内部状态不一致错误
    pub fn is_invariant_error(&self) -> bool {
        matches!(self, AnalyzerError::Invariant { .. })
    }

    /// 检查是否为配置错误（包括配置文件解析与 breakoff 日期错误）
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AnalyzerError::Config(_)
                | AnalyzerError::Toml(_)
                | AnalyzerError::Breakoff { .. }
        )
    }
}
