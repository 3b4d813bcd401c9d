//! 行分类器 - 边界识别与命令解析
//!
//! general query log 没有显式的记录分隔符。一行日志只能是三种形态之一：
//!
//! ```text
//! 171215 10:00:00	    5 Connect	user1@host on db1      ← 带时间戳的边界行
//! 		    5 Query	SELECT name                        ← 按列对齐的边界行
//! 		FROM users WHERE id = 7                        ← SQL 续行
//! ```
//!
//! 制表符展开后，边界行要么以 `YYMMDD H:MM:SS` 开头，要么以空白 + 连接 ID 开头。
//! 这是一个尽力而为的启发式规则：以空白缩进、以数字开头的 SQL 续行
//! （例如 `    1 AS QUOTA`）同样会被识别为边界行，这里保留这一行为，不做修正。

use crate::genlog::types::{Action, ConnectInfo, ConnId, Header, LogLine};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// 可选的时间戳，然后是连接 ID 和剩余文本
    static ref HEADER_RE: Regex = Regex::new(
        r"^(?:(\d{6}\s+\d{1,2}:\d{2}:\d{2}))?\s+(\d+)\s+(\S.*?)\s*$"
    )
    .unwrap();

    /// 服务器启动横幅、端口行和列标题
    static ref BOILERPLATE: [Regex; 3] = [
        Regex::new(r"^\S.*, Version: .*started with:\s*$").unwrap(),
        Regex::new(r"^Tcp port: \d+\s+Unix socket: .*$").unwrap(),
        Regex::new(r"^Time\s+Id\s+Command\s+Argument\s*$").unwrap(),
    ];
}

/// 会打开语句捕获或改变会话状态的命令，按匹配顺序排列
const SESSION_COMMANDS: &[&str] = &[
    "Close stmt",
    "Init DB",
    "Connect",
    "Query",
    "Prepare",
    "Execute",
    "Quit",
    "Refresh",
];

/// 识别但忽略的服务器命令
const IGNORED_COMMANDS: &[&str] = &[
    "Field List",
    "Statistics",
    "Ping",
    "Shutdown",
    "Change user",
    "Reset stmt",
    "Long Data",
    "Fetch",
    "Set option",
    "Kill",
    "Processlist",
    "Debug",
    "Time",
    "Binlog Dump",
    "Connect Out",
    "Delayed insert",
    "Table Dump",
    "Register Slave",
    "Daemon",
    "Error",
];

/// 判断是否为固定的样板行
#[must_use]
pub fn is_boilerplate(line: &str) -> bool {
    BOILERPLATE.iter().any(|re| re.is_match(line))
}

/// 对一行（制表符已展开的）日志进行分类
#[must_use]
pub fn classify(line: &str) -> LogLine<'_> {
    if line.trim().is_empty() {
        return LogLine::Blank;
    }
    if is_boilerplate(line) {
        tracing::trace!("跳过样板行: {}", line);
        return LogLine::Ignorable;
    }

    if let Some(caps) = HEADER_RE.captures(line) {
        // 连接 ID 溢出时按续行处理
        let conn_id = caps.get(2).and_then(|m| m.as_str().parse::<ConnId>().ok());
        if let (Some(conn_id), Some(rest)) = (conn_id, caps.get(3)) {
            return LogLine::Header(Header {
                timestamp: caps.get(1).map(|m| m.as_str()),
                conn_id,
                remainder: rest.as_str(),
            });
        }
    }

    LogLine::Fragment(line.trim())
}

/// 取出关键字之后的参数；关键字后必须是空白或行尾
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

impl<'a> Action<'a> {
    /// 从边界行的剩余文本解析命令
    pub fn parse(remainder: &'a str) -> Self {
        // 忽略表先匹配：`Connect Out` 不能被当作 `Connect`
        if let Some(keyword) = IGNORED_COMMANDS
            .iter()
            .find(|keyword| strip_keyword(remainder, keyword).is_some())
        {
            return Action::Ignored(*keyword);
        }

        for keyword in SESSION_COMMANDS {
            if let Some(arg) = strip_keyword(remainder, keyword) {
                return match *keyword {
                    "Close stmt" => Action::CloseStmt,
                    "Init DB" => Action::InitDb(arg),
                    "Connect" => Action::Connect(arg),
                    "Query" => Action::Query(arg),
                    "Prepare" => Action::Prepare(arg),
                    "Execute" => Action::Execute(arg),
                    "Quit" => Action::Quit,
                    _ => Action::Refresh,
                };
            }
        }
        Action::Unknown
    }
}

impl ConnectInfo {
    /// 解析 `Connect` 命令的参数。
    ///
    /// 支持的形态：
    /// - `user@host on db`
    /// - `user@host on`（未选择数据库）
    /// - `user@host as anonymous on db`
    /// - `user@host on db using TCP/IP`
    ///
    /// `Access denied for user ...` 等失败连接返回 `None`。
    pub fn parse(arg: &str) -> Option<Self> {
        let mut tokens = arg.split_whitespace();
        let user = tokens.next().filter(|u| u.contains('@'))?;

        let mut next = tokens.next();
        if next == Some("as") {
            tokens.next()?;
            next = tokens.next();
        }
        if next != Some("on") {
            return None;
        }

        let database = tokens
            .next()
            .filter(|db| *db != "using")
            .map(ToString::to_string);

        Some(Self { user: user.to_string(), database })
    }
}
