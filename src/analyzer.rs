//! 分析流水线
//!
//! [`Analyzer`] 持有一次运行的全部可变状态：连接注册表、用户统计、语句累加器、
//! 过滤器与聚类引擎。输入严格按行顺序处理，一行处理完毕（包括冲刷上一条语句
//! 及其聚类比较）后才读取下一行。
//!
//! ```text
//! 原始行 → expand_tabs → classify ─┬─ Header ── 时间戳/breakoff ── flush ── Action
//!                                  │                                │         │
//!                                  │                    handle_statement   registry/stats
//!                                  ├─ Fragment ── append
//!                                  └─ Ignorable/Blank
//! ```
//!
//! 到达 breakoff 日期时立即停止，正在捕获的语句不会被冲刷。

use crate::cluster::ClusterEngine;
use crate::config::AnalysisConfig;
use crate::diagnostics::{
    Diagnostic, DiagnosticCounts, DiagnosticKind, DiagnosticSink,
};
use crate::error::{AnalyzerError, Result};
use crate::genlog::io::LineReader;
use crate::genlog::{
    Action, ConnId, ConnectInfo, Header, LogLine, PendingStatement,
    StatementAccumulator, classify, expand_tabs, parse_timestamp,
};
use crate::registry::{BOOTSTRAP_USER, ConnectionRegistry};
use crate::report::{Report, ReportMode};
use crate::statement::{Classification, ExclusionRule, StatementFilter, Verb, normalize};
use crate::stats::Aggregator;
use chrono::{NaiveDate, NaiveDateTime};
use std::io::BufRead;

/// 处理一行后的流向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// 已到达 breakoff，停止读取
    Halt,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 已读取的行数
    pub lines: usize,
    /// 是否因 breakoff 提前结束
    pub halted: bool,
}

/// general query log 分析器
pub struct Analyzer<S: DiagnosticSink = Vec<Diagnostic>> {
    mode: ReportMode,
    tab_width: usize,
    breakoff: Option<NaiveDate>,
    registry: ConnectionRegistry,
    aggregator: Aggregator,
    accumulator: StatementAccumulator,
    filter: StatementFilter,
    cluster: Option<ClusterEngine>,
    current_timestamp: Option<NaiveDateTime>,
    line_num: usize,
    halted: bool,
    counts: DiagnosticCounts,
    sink: S,
}

impl Analyzer<Vec<Diagnostic>> {
    /// 使用内存诊断收集器创建
    pub fn collecting(config: &AnalysisConfig) -> Result<Self> {
        Self::new(config, Vec::new())
    }
}

impl<S: DiagnosticSink> Analyzer<S> {
    pub fn new(config: &AnalysisConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let mode =
            if config.coarse { ReportMode::Coarse } else { ReportMode::Fine };
        let cluster = match mode {
            ReportMode::Coarse => None,
            ReportMode::Fine => {
                Some(ClusterEngine::new(config.mangler()?, config.threshold))
            }
        };

        tracing::debug!(
            mode = ?mode,
            breakoff = ?config.breakoff,
            threshold = config.threshold,
            "创建分析器"
        );

        Ok(Self {
            mode,
            tab_width: config.tab_width,
            breakoff: config.breakoff_date()?,
            registry: ConnectionRegistry::new(),
            aggregator: Aggregator::new(),
            accumulator: StatementAccumulator::new(),
            filter: config.statement_filter()?,
            cluster,
            current_timestamp: None,
            line_num: 0,
            halted: false,
            counts: DiagnosticCounts::default(),
            sink,
        })
    }

    /// 追加一条排除规则
    pub fn add_exclusion<R: ExclusionRule + 'static>(&mut self, rule: R) {
        self.filter.push_rule(rule);
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// 最近一次带时间戳的边界行的时间
    pub fn current_timestamp(&self) -> Option<NaiveDateTime> {
        self.current_timestamp
    }

    /// 当前是否有语句在捕获中
    pub fn is_capturing(&self) -> bool {
        self.accumulator.is_open()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn diagnostic_counts(&self) -> &DiagnosticCounts {
        &self.counts
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 已处理的行数
    pub fn line_num(&self) -> usize {
        self.line_num
    }

    fn emit(&mut self, kind: DiagnosticKind) {
        self.counts.record(&kind);
        self.sink.emit(Diagnostic::new(self.line_num, kind));
    }

    /// 处理一行日志
    ///
    /// # Errors
    /// 只有内部状态不一致时返回错误，此时应终止运行。
    pub fn process_line(&mut self, raw: &str) -> Result<Flow> {
        if self.halted {
            return Ok(Flow::Halt);
        }
        self.line_num += 1;

        let line = expand_tabs(raw, self.tab_width);
        match classify(&line) {
            LogLine::Header(header) => self.handle_header(&header),
            LogLine::Fragment(text) => {
                if !self.accumulator.append(text) {
                    self.emit(DiagnosticKind::Malformed {
                        content: text.to_string(),
                    });
                }
                Ok(Flow::Continue)
            }
            LogLine::Ignorable | LogLine::Blank => Ok(Flow::Continue),
        }
    }

    fn handle_header(&mut self, header: &Header<'_>) -> Result<Flow> {
        if let Some(raw) = header.timestamp {
            match parse_timestamp(raw) {
                Some(ts) => {
                    if self.breakoff.is_some_and(|cutoff| ts.date() >= cutoff) {
                        tracing::info!(
                            line = self.line_num,
                            timestamp = %ts,
                            "到达 breakoff 日期，停止处理"
                        );
                        self.halted = true;
                        return Ok(Flow::Halt);
                    }
                    self.current_timestamp = Some(ts);
                }
                None => self.emit(DiagnosticKind::BadTimestamp {
                    raw: raw.to_string(),
                }),
            }
        }

        if let Some(pending) = self.accumulator.flush() {
            self.handle_statement(pending)?;
        }

        let conn_id = header.conn_id;
        let action = Action::parse(header.remainder);
        match action {
            Action::Connect(arg) => match ConnectInfo::parse(arg) {
                Some(info) => {
                    let stale = self.registry.connect(
                        conn_id,
                        &info.user,
                        info.database,
                        self.current_timestamp,
                    );
                    self.aggregator.record_connection(&info.user);
                    if let Some(prev) = stale.filter(|p| !p.implicit) {
                        self.emit(DiagnosticKind::ServerRestart {
                            conn_id,
                            previous_user: prev.user,
                            user: info.user,
                        });
                    }
                }
                None => self.emit(DiagnosticKind::UnparsedConnect {
                    conn_id,
                    content: arg.to_string(),
                }),
            },
            Action::Quit => {
                if self.registry.disconnect(conn_id).is_none() {
                    self.emit(DiagnosticKind::DisconnectUnknown { conn_id });
                }
            }
            Action::InitDb(db) => {
                if self.registry.set_database(conn_id, db) {
                    self.emit(DiagnosticKind::DatabaseChange {
                        conn_id,
                        database: db.to_string(),
                    });
                } else {
                    self.emit(DiagnosticKind::UnknownConnection {
                        conn_id,
                        action: action.name(),
                    });
                }
            }
            Action::Query(_) | Action::Execute(_) | Action::Prepare(_) => {
                self.open_capture(conn_id, &action)?;
            }
            Action::Refresh | Action::CloseStmt | Action::Ignored(_) => {
                tracing::trace!(conn_id, command = action.name(), "忽略命令");
            }
            Action::Unknown => {
                let content = match header.timestamp {
                    Some(ts) => format!("{ts} {conn_id} {}", header.remainder),
                    None => format!("{conn_id} {}", header.remainder),
                };
                self.emit(DiagnosticKind::Malformed { content });
            }
        }
        Ok(Flow::Continue)
    }

    /// 为连接当前的用户打开语句捕获；未知连接时报告并丢弃该行
    fn open_capture(&mut self, conn_id: ConnId, action: &Action<'_>) -> Result<()> {
        let Some(body) = action.capture_text() else {
            return Ok(());
        };
        let Some(conn) = self.registry.lookup(conn_id) else {
            self.emit(DiagnosticKind::UnknownConnection {
                conn_id,
                action: action.name(),
            });
            return Ok(());
        };
        let user = conn.user.clone();
        let is_prepare = matches!(action, Action::Prepare(_));
        self.accumulator.open(self.line_num, body, &user, is_prepare)
    }

    /// 对冲刷出的语句分类、计数并聚类
    fn handle_statement(&mut self, pending: PendingStatement) -> Result<()> {
        let normalized = normalize(&pending.text);
        let verb = match self.filter.classify(&normalized, pending.is_prepare) {
            Classification::Empty => return Ok(()),
            Classification::Uninteresting => {
                tracing::trace!(line = pending.line, "跳过无关语句: {}", normalized);
                return Ok(());
            }
            Classification::Prepare => {
                self.emit(DiagnosticKind::Prepare {
                    user: pending.user,
                    statement: normalized,
                });
                return Ok(());
            }
            Classification::Countable(verb) => verb,
        };

        // 预置会话没有 Connect 行，首次计数时才创建 root 的统计条目
        if pending.user == BOOTSTRAP_USER {
            self.aggregator.ensure_user(BOOTSTRAP_USER);
        }

        let Some(stats) = self.aggregator.get_mut(&pending.user) else {
            return Err(AnalyzerError::invariant(
                pending.line,
                format!(
                    "用户 {} 没有统计条目，语句: {}",
                    pending.user, normalized
                ),
            ));
        };
        stats.record_query(verb);
        if let Some(engine) = &self.cluster {
            engine.observe(&mut stats.templates, &normalized);
        }

        if verb == Verb::Other {
            self.emit(DiagnosticKind::UnknownVerb {
                user: pending.user,
                statement: normalized,
            });
        }
        Ok(())
    }

    /// 从读取器逐行处理直到结束或到达 breakoff
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<RunSummary> {
        let mut reader = LineReader::new(input);
        while let Some(line) = reader.next_line()? {
            if self.process_line(&line)? == Flow::Halt {
                break;
            }
        }
        let summary =
            RunSummary { lines: reader.line_num(), halted: self.halted };
        tracing::info!(
            lines = summary.lines,
            halted = summary.halted,
            users = self.aggregator.len(),
            queries = self.aggregator.total_queries(),
            live_connections = self.registry.len(),
            "日志处理完成"
        );
        Ok(summary)
    }

    /// 结束运行并生成报告。
    ///
    /// 正常结束时冲刷最后一条语句；因 breakoff 停止时不冲刷。
    pub fn finish(mut self) -> Result<(Report, S)> {
        if !self.halted {
            if let Some(pending) = self.accumulator.flush() {
                self.handle_statement(pending)?;
            }
        }
        if self.counts.warnings() > 0 {
            tracing::info!("诊断统计: {}", self.counts);
        }
        Ok((Report::new(self.mode, self.aggregator), self.sink))
    }
}
