//! 配置管理模块
//!
//! 提供统一的配置文件读取和管理功能。所有字段都有默认值，配置文件中
//! 只需写出需要覆盖的部分：
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [analysis]
//! coarse = false
//! breakoff = "2018-01-01"
//! threshold = 0.2
//! exclude_patterns = ["^SELECT 1$"]
//! mask_columns = ["SESSION_KEY"]
//! ```

use crate::cluster::{DEFAULT_THRESHOLD, Mangler};
use crate::error::{AnalyzerError, Result};
use crate::genlog::utils::{DEFAULT_TAB_WIDTH, parse_breakoff};
use crate::statement::StatementFilter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 主配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 日志配置
    pub log: LogConfig,
    /// 分析配置
    pub analysis: AnalysisConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 是否启用日志输出
    pub enabled: bool,
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
    /// 日志文件目录，不设置时只输出到 stderr
    pub log_dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { enabled: true, level: "info".to_string(), log_dir: None }
    }
}

/// 分析配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 输出额外诊断
    pub verbose: bool,
    /// 粗粒度模式：只统计动词，不聚类
    pub coarse: bool,
    /// `YYYY-MM-DD`，处理到该日期之前为止
    pub breakoff: Option<String>,
    /// 制表符宽度
    pub tab_width: usize,
    /// 聚类阈值（归一化编辑距离严格小于该值视为同一模板）
    pub threshold: f64,
    /// 额外的排除模式（作用于规范化后的语句，大小写不敏感）
    pub exclude_patterns: Vec<String>,
    /// 赋值总是被遮蔽的列名
    pub mask_columns: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            coarse: false,
            breakoff: None,
            tab_width: DEFAULT_TAB_WIDTH,
            threshold: DEFAULT_THRESHOLD,
            exclude_patterns: Vec::new(),
            mask_columns: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// 解析 breakoff 日期
    pub fn breakoff_date(&self) -> Result<Option<NaiveDate>> {
        self.breakoff.as_deref().map(parse_breakoff).transpose()
    }

    /// 根据排除模式构造语句过滤器
    pub fn statement_filter(&self) -> Result<StatementFilter> {
        StatementFilter::from_patterns(&self.exclude_patterns)
    }

    /// 根据列名规则构造遮蔽器
    pub fn mangler(&self) -> Result<Mangler> {
        Mangler::with_columns(&self.mask_columns)
    }

    /// 验证分析配置
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(AnalyzerError::config(format!(
                "聚类阈值必须在 (0, 1] 之间: {}",
                self.threshold
            )));
        }
        if self.tab_width == 0 {
            return Err(AnalyzerError::config("制表符宽度不能为0"));
        }
        self.breakoff_date()?;
        self.statement_filter()?;
        self.mangler()?;
        Ok(())
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// 从字符串加载配置
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        match self.log.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(AnalyzerError::config(format!(
                    "无效的日志级别: {}",
                    self.log.level
                )));
            }
        }
        self.analysis.validate()
    }
}
