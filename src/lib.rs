//! MySQL 5.6 general query log 分析库
//!
//! 逐行读取 general query log，跟踪连接与用户，统计每个用户的语句类型，
//! 并把语句遮蔽字面量后按编辑距离聚类成模板。

pub mod analyzer;
pub mod cluster;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod genlog;
#[cfg(feature = "logging")]
pub mod logging;
pub mod registry;
pub mod report;
pub mod statement;
pub mod stats;

pub use analyzer::{Analyzer, Flow, RunSummary};
pub use config::{AnalysisConfig, Config};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, WriterSink};
pub use error::{AnalyzerError, Result};
pub use report::{Report, ReportMode};
