//! 按用户聚合的统计信息

use crate::cluster::TemplateSet;
use crate::statement::Verb;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// 各动词的语句数
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct VerbCounts {
    pub select: u64,
    pub update: u64,
    pub insert: u64,
    pub alter: u64,
    pub delete: u64,
    pub drop: u64,
    pub call: u64,
    pub other: u64,
}

impl VerbCounts {
    /// 读取某个动词的计数
    pub fn get(&self, verb: Verb) -> u64 {
        match verb {
            Verb::Select => self.select,
            Verb::Update => self.update,
            Verb::Insert => self.insert,
            Verb::Alter => self.alter,
            Verb::Delete => self.delete,
            Verb::Drop => self.drop,
            Verb::Call => self.call,
            Verb::Other => self.other,
        }
    }

    fn slot_mut(&mut self, verb: Verb) -> &mut u64 {
        match verb {
            Verb::Select => &mut self.select,
            Verb::Update => &mut self.update,
            Verb::Insert => &mut self.insert,
            Verb::Alter => &mut self.alter,
            Verb::Delete => &mut self.delete,
            Verb::Drop => &mut self.drop,
            Verb::Call => &mut self.call,
            Verb::Other => &mut self.other,
        }
    }

    /// 所有动词计数之和
    pub fn total(&self) -> u64 {
        Verb::ALL.iter().map(|v| self.get(*v)).sum()
    }
}

/// 单个用户的统计
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    /// `name@host` 形式的用户
    pub user: String,
    /// 连接次数
    pub connections: u64,
    /// 计入统计的语句总数
    pub queries: u64,
    /// 各动词计数，总和等于 `queries`
    pub verbs: VerbCounts,
    /// 聚类模板（仅细粒度模式）
    pub templates: TemplateSet,
}

impl UserStats {
    pub fn new<S: Into<String>>(user: S) -> Self {
        Self {
            user: user.into(),
            connections: 0,
            queries: 0,
            verbs: VerbCounts::default(),
            templates: TemplateSet::new(),
        }
    }

    /// 记录一条计入统计的语句
    pub fn record_query(&mut self, verb: Verb) {
        self.queries += 1;
        *self.verbs.slot_mut(verb) += 1;
    }
}

impl fmt::Display for UserStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} queries, {} connections",
            self.user, self.queries, self.connections
        )?;
        for verb in Verb::ALL {
            write!(f, ", {} {}", self.verbs.get(verb), verb.label())?;
        }
        Ok(())
    }
}

/// 用户 → 统计 的聚合器
#[derive(Debug, Default, Clone)]
pub struct Aggregator {
    users: HashMap<String, UserStats>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 确保用户存在统计条目
    pub fn ensure_user(&mut self, user: &str) -> &mut UserStats {
        self.users
            .entry(user.to_string())
            .or_insert_with(|| UserStats::new(user))
    }

    /// 记录一次连接，首次出现时创建条目
    pub fn record_connection(&mut self, user: &str) -> &mut UserStats {
        let stats = self.ensure_user(user);
        stats.connections += 1;
        stats
    }

    pub fn get(&self, user: &str) -> Option<&UserStats> {
        self.users.get(user)
    }

    pub fn get_mut(&mut self, user: &str) -> Option<&mut UserStats> {
        self.users.get_mut(user)
    }

    /// 用户数
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// 全部用户的语句总数
    pub fn total_queries(&self) -> u64 {
        self.users.values().map(|s| s.queries).sum()
    }

    /// 按语句数降序（相同时按用户名升序）取出全部统计
    pub fn into_sorted(self) -> Vec<UserStats> {
        let mut users: Vec<UserStats> = self.users.into_values().collect();
        users.sort_by(|a, b| {
            b.queries.cmp(&a.queries).then_with(|| a.user.cmp(&b.user))
        });
        users
    }
}
