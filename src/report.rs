//! 报告渲染
//!
//! 粗粒度模式每个用户一行，列出各动词计数；细粒度模式按用户列出全部模板，
//! 模板按出现次数降序。用户按语句数降序，相同时按用户名升序。

use crate::stats::{Aggregator, UserStats};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// 报告模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// 只统计动词
    Coarse,
    /// 输出聚类模板
    Fine,
}

/// 运行结束时生成的报告
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub mode: ReportMode,
    pub users: Vec<UserStats>,
}

impl Report {
    /// 从聚合器生成报告
    pub fn new(mode: ReportMode, aggregator: Aggregator) -> Self {
        Self { mode, users: aggregator.into_sorted() }
    }

    /// 查找某个用户
    pub fn user(&self, user: &str) -> Option<&UserStats> {
        self.users.iter().find(|s| s.user == user)
    }

    /// 写出文本报告
    pub fn render<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "{self}")?;
        out.flush()
    }

    /// 序列化为 JSON
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ReportMode::Coarse => {
                for stats in &self.users {
                    writeln!(f, "{stats}")?;
                }
            }
            ReportMode::Fine => {
                for (i, stats) in self.users.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    writeln!(
                        f,
                        "{}: {} queries, {} connections, {} templates",
                        stats.user,
                        stats.queries,
                        stats.connections,
                        stats.templates.len()
                    )?;
                    for template in stats.templates.iter() {
                        writeln!(f, "{:>8}  {}", template.count, template.text)?;
                    }
                }
            }
        }
        Ok(())
    }
}
