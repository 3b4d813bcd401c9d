//! 诊断输出
//!
//! 日志中大量的数据质量问题（截断导致的未知连接、无法识别的行、服务器重启等）
//! 都不应中断处理。它们以 [`Diagnostic`] 的形式交给 [`DiagnosticSink`]，
//! 与报告输出完全分离：命令行下写入 stderr，测试中收集到 `Vec`。
//!
//! 告警级别的诊断总是输出；提示级别（PREPARE、切换数据库）只在 verbose 下输出。

use crate::genlog::ConnId;
use std::fmt;
use std::io::{self, Write};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// 仅 verbose 模式输出
    Notice,
    /// 总是输出
    Warning,
}

/// 诊断类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// 无法识别的行或命令
    Malformed { content: String },
    /// 引用了注册表中不存在的连接
    UnknownConnection { conn_id: ConnId, action: &'static str },
    /// 断开一个不存在的连接
    DisconnectUnknown { conn_id: ConnId },
    /// 连接 ID 在未断开时被复用
    ServerRestart { conn_id: ConnId, previous_user: String, user: String },
    /// 无法解析的 Connect 参数（例如 Access denied）
    UnparsedConnect { conn_id: ConnId, content: String },
    /// 时间戳不是合法日期
    BadTimestamp { raw: String },
    /// 无法归类的语句动词
    UnknownVerb { user: String, statement: String },
    /// PREPARE 语句，不计数
    Prepare { user: String, statement: String },
    /// 会话切换数据库
    DatabaseChange { conn_id: ConnId, database: String },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::Prepare { .. }
            | DiagnosticKind::DatabaseChange { .. } => Severity::Notice,
            _ => Severity::Warning,
        }
    }
}

/// 一条诊断
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 触发诊断的行号
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind) -> Self {
        Self { line, kind }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "行{}: ", self.line)?;
        match &self.kind {
            DiagnosticKind::Malformed { content } => {
                write!(f, "无法解析: {content}")
            }
            DiagnosticKind::UnknownConnection { conn_id, action } => {
                write!(f, "未知连接 {conn_id} ({action})，已丢弃")
            }
            DiagnosticKind::DisconnectUnknown { conn_id } => {
                write!(f, "断开未知连接 {conn_id}")
            }
            DiagnosticKind::ServerRestart { conn_id, previous_user, user } => {
                write!(
                    f,
                    "连接 {conn_id} 被复用 ({previous_user} → {user})，推测服务器已重启"
                )
            }
            DiagnosticKind::UnparsedConnect { conn_id, content } => {
                write!(f, "连接 {conn_id} 的 Connect 参数无法解析: {content}")
            }
            DiagnosticKind::BadTimestamp { raw } => {
                write!(f, "无效时间戳: {raw}")
            }
            DiagnosticKind::UnknownVerb { user, statement } => {
                write!(f, "未知语句类型 ({user}): {statement}")
            }
            DiagnosticKind::Prepare { user, statement } => {
                write!(f, "PREPARE ({user}): {statement}")
            }
            DiagnosticKind::DatabaseChange { conn_id, database } => {
                write!(f, "连接 {conn_id} 切换数据库: {database}")
            }
        }
    }
}

/// 诊断接收者
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// 把诊断逐行写入任意 writer（命令行下为 stderr）
pub struct WriterSink<W: Write> {
    writer: W,
    verbose: bool,
}

impl WriterSink<io::Stderr> {
    /// 写入标准错误
    pub fn stderr(verbose: bool) -> Self {
        Self::new(io::stderr(), verbose)
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, verbose: bool) -> Self {
        Self { writer, verbose }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity() == Severity::Notice && !self.verbose {
            return;
        }
        if let Err(e) = writeln!(self.writer, "{diagnostic}") {
            tracing::error!("写入诊断信息失败: {}", e);
        }
    }
}

/// 各类诊断的累计次数
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiagnosticCounts {
    pub malformed: u64,
    pub unknown_connection: u64,
    pub disconnect_unknown: u64,
    pub server_restart: u64,
    pub unparsed_connect: u64,
    pub bad_timestamp: u64,
    pub unknown_verb: u64,
    pub prepare: u64,
    pub database_change: u64,
}

impl DiagnosticCounts {
    pub fn record(&mut self, kind: &DiagnosticKind) {
        let slot = match kind {
            DiagnosticKind::Malformed { .. } => &mut self.malformed,
            DiagnosticKind::UnknownConnection { .. } => {
                &mut self.unknown_connection
            }
            DiagnosticKind::DisconnectUnknown { .. } => {
                &mut self.disconnect_unknown
            }
            DiagnosticKind::ServerRestart { .. } => &mut self.server_restart,
            DiagnosticKind::UnparsedConnect { .. } => &mut self.unparsed_connect,
            DiagnosticKind::BadTimestamp { .. } => &mut self.bad_timestamp,
            DiagnosticKind::UnknownVerb { .. } => &mut self.unknown_verb,
            DiagnosticKind::Prepare { .. } => &mut self.prepare,
            DiagnosticKind::DatabaseChange { .. } => &mut self.database_change,
        };
        *slot += 1;
    }

    /// 告警级别诊断的总数
    pub fn warnings(&self) -> u64 {
        self.malformed
            + self.unknown_connection
            + self.disconnect_unknown
            + self.server_restart
            + self.unparsed_connect
            + self.bad_timestamp
            + self.unknown_verb
    }
}

impl fmt::Display for DiagnosticCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "无法解析: {}, 未知连接: {}, 断开未知连接: {}, 服务器重启: {}, Connect 无法解析: {}, 无效时间戳: {}, 未知语句类型: {}, PREPARE: {}, 切换数据库: {}",
            self.malformed,
            self.unknown_connection,
            self.disconnect_unknown,
            self.server_restart,
            self.unparsed_connect,
            self.bad_timestamp,
            self.unknown_verb,
            self.prepare,
            self.database_change
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_filters_notices() {
        let mut sink = WriterSink::new(Vec::new(), false);
        sink.emit(Diagnostic::new(
            3,
            DiagnosticKind::DatabaseChange { conn_id: 5, database: "shop".into() },
        ));
        sink.emit(Diagnostic::new(4, DiagnosticKind::DisconnectUnknown { conn_id: 9 }));
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("行4"));
        assert!(out.contains('9'));
    }

    #[test]
    fn test_writer_sink_verbose_keeps_notices() {
        let mut sink = WriterSink::new(Vec::new(), true);
        sink.emit(Diagnostic::new(
            1,
            DiagnosticKind::Prepare { user: "a@h".into(), statement: "SELECT ?".into() },
        ));
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains("PREPARE (a@h): SELECT ?"));
    }

    #[test]
    fn test_counts() {
        let mut counts = DiagnosticCounts::default();
        counts.record(&DiagnosticKind::BadTimestamp { raw: "x".into() });
        counts.record(&DiagnosticKind::Prepare { user: "u".into(), statement: "s".into() });
        assert_eq!(counts.bad_timestamp, 1);
        assert_eq!(counts.prepare, 1);
        assert_eq!(counts.warnings(), 1);
        assert!(counts.to_string().contains("无效时间戳: 1"));
    }
}
