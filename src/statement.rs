//! 语句分类与过滤
//!
//! 捕获到的 SQL 先规范化（大写、合并空白、去首尾空白），再依次判断：
//! 空语句 → 无关语句（会话设置、SHOW、事务控制等）→ PREPARE → 计数。

use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();

    /// 会话设置与其他不计入统计的语句
    static ref UNINTERESTING_RE: Regex = Regex::new(
        r"^(?:SET\b|SELECT @@|SELECT DATABASE\(\)|SHOW\b|COMMIT\b|ROLLBACK\b|BEGIN\b|START TRANSACTION\b|USE\b|EXPLAIN\b|DESCRIBE\b|DESC\b|LOCK TABLES?\b|UNLOCK TABLES?\b|FLUSH\b)"
    )
    .unwrap();
}

/// 语句动词分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Select,
    Update,
    Insert,
    Alter,
    Delete,
    Drop,
    Call,
    Other,
}

/// 按顺序匹配的动词前缀
const VERB_PREFIXES: &[(&str, Verb)] = &[
    ("SELECT", Verb::Select),
    ("UPDATE", Verb::Update),
    ("INSERT", Verb::Insert),
    ("ALTER", Verb::Alter),
    ("DELETE", Verb::Delete),
    ("DROP", Verb::Drop),
    ("CALL", Verb::Call),
];

impl Verb {
    /// 报告中的输出顺序
    pub const ALL: [Verb; 8] = [
        Verb::Select,
        Verb::Update,
        Verb::Insert,
        Verb::Alter,
        Verb::Delete,
        Verb::Drop,
        Verb::Call,
        Verb::Other,
    ];

    /// 对规范化后的语句判断动词
    pub fn of(normalized: &str) -> Self {
        VERB_PREFIXES
            .iter()
            .find(|(prefix, _)| normalized.starts_with(prefix))
            .map_or(Verb::Other, |(_, verb)| *verb)
    }

    /// 报告中使用的复数标签
    pub fn label(self) -> &'static str {
        match self {
            Verb::Select => "selects",
            Verb::Update => "updates",
            Verb::Insert => "inserts",
            Verb::Alter => "alters",
            Verb::Delete => "deletes",
            Verb::Drop => "drops",
            Verb::Call => "calls",
            Verb::Other => "other",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 规范化语句：大写、空白合并为单个空格、去除首尾空白
#[must_use]
pub fn normalize(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), " ").to_uppercase()
}

/// 可插拔的排除规则，作用于规范化后的语句
pub trait ExclusionRule {
    fn excludes(&self, normalized: &str) -> bool;
}

impl<F> ExclusionRule for F
where
    F: Fn(&str) -> bool,
{
    fn excludes(&self, normalized: &str) -> bool {
        self(normalized)
    }
}

impl ExclusionRule for Regex {
    fn excludes(&self, normalized: &str) -> bool {
        self.is_match(normalized)
    }
}

/// 单条语句的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 规范化后为空
    Empty,
    /// 无关语句，不计数
    Uninteresting,
    /// PREPARE 占位，真正的语句随后由 EXECUTE 带出
    Prepare,
    /// 计入统计
    Countable(Verb),
}

/// 语句过滤器：内置无关模式 + 额外排除规则
#[derive(Default)]
pub struct StatementFilter {
    rules: Vec<Box<dyn ExclusionRule>>,
}

impl fmt::Debug for StatementFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementFilter")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl StatementFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由正则表达式列表构造，模式按大小写不敏感编译
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut filter = Self::new();
        for pattern in patterns {
            let re = Regex::new(&format!("(?i){}", pattern.as_ref()))?;
            filter.push_rule(re);
        }
        Ok(filter)
    }

    /// 追加一条排除规则
    pub fn push_rule<R: ExclusionRule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    #[must_use]
    pub fn with_rule<R: ExclusionRule + 'static>(mut self, rule: R) -> Self {
        self.push_rule(rule);
        self
    }

    /// 是否为无关语句
    pub fn is_uninteresting(&self, normalized: &str) -> bool {
        UNINTERESTING_RE.is_match(normalized)
            || self.rules.iter().any(|r| r.excludes(normalized))
    }

    /// 对规范化后的语句分类
    pub fn classify(&self, normalized: &str, is_prepare: bool) -> Classification {
        if normalized.is_empty() {
            Classification::Empty
        } else if self.is_uninteresting(normalized) {
            Classification::Uninteresting
        } else if is_prepare {
            Classification::Prepare
        } else {
            Classification::Countable(Verb::of(normalized))
        }
    }
}
