//! 连接注册表 - 连接 ID 到活动会话的映射
//!
//! 连接 ID 是服务器按序分配的小整数，服务器重启后会从头复用。因此同一个 ID
//! 在没有 `Quit` 的情况下再次 `Connect` 时，旧会话被视为随重启消失，直接替换。

use crate::genlog::ConnId;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

/// 预置会话的连接 ID
pub const BOOTSTRAP_CONN_ID: ConnId = 1;
/// 预置会话的用户
pub const BOOTSTRAP_USER: &str = "root";

/// 一个活动连接
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveConnection {
    /// `name@host` 形式的用户
    pub user: String,
    /// 建立连接时的时间戳
    pub connected_at: Option<NaiveDateTime>,
    /// 当前选择的数据库
    pub database: Option<String>,
    /// 是否为启动时预置的会话（日志中第一个连接是隐式的）
    pub implicit: bool,
}

/// 连接注册表，同一 ID 任意时刻最多一个活动会话
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    live: HashMap<ConnId, LiveConnection>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    /// 创建注册表，预置连接 1 为 `root` 会话
    pub fn new() -> Self {
        let mut live = HashMap::new();
        live.insert(
            BOOTSTRAP_CONN_ID,
            LiveConnection {
                user: BOOTSTRAP_USER.to_string(),
                connected_at: None,
                database: None,
                implicit: true,
            },
        );
        Self { live }
    }

    /// 创建不带预置会话的空注册表
    pub fn empty() -> Self {
        Self { live: HashMap::new() }
    }

    /// 登记新连接；若 ID 已被占用，先移除旧会话并将其返回
    pub fn connect(
        &mut self,
        conn_id: ConnId,
        user: &str,
        database: Option<String>,
        connected_at: Option<NaiveDateTime>,
    ) -> Option<LiveConnection> {
        let stale = self.live.remove(&conn_id);
        if let Some(prev) = &stale {
            if prev.implicit {
                tracing::debug!(conn_id, user, "替换预置会话");
            } else {
                tracing::warn!(
                    conn_id,
                    previous = %prev.user,
                    user,
                    "连接 ID 被复用，推测服务器已重启"
                );
            }
        }

        tracing::debug!(conn_id, user, database = ?database, "新连接");
        self.live.insert(
            conn_id,
            LiveConnection {
                user: user.to_string(),
                connected_at,
                database,
                implicit: false,
            },
        );
        stale
    }

    /// 查询活动会话
    pub fn lookup(&self, conn_id: ConnId) -> Option<&LiveConnection> {
        self.live.get(&conn_id)
    }

    /// 断开连接，返回被移除的会话
    pub fn disconnect(&mut self, conn_id: ConnId) -> Option<LiveConnection> {
        let removed = self.live.remove(&conn_id);
        match &removed {
            Some(conn) => tracing::debug!(conn_id, user = %conn.user, "断开连接"),
            None => tracing::warn!(conn_id, "断开未知连接"),
        }
        removed
    }

    /// 切换会话的当前数据库；连接不存在时返回 `false`
    pub fn set_database(&mut self, conn_id: ConnId, database: &str) -> bool {
        match self.live.get_mut(&conn_id) {
            Some(conn) => {
                tracing::debug!(conn_id, user = %conn.user, database, "切换数据库");
                conn.database = Some(database.to_string());
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, conn_id: ConnId) -> bool {
        self.live.contains_key(&conn_id)
    }

    /// 活动连接数
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
