//! general query log 的行级类型定义

/// 连接 ID（服务器分配，重启后会被复用）
pub type ConnId = u64;

/// 单行日志的结构分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine<'a> {
    /// 会话/语句边界行：带时间戳的行或按列对齐的连接 ID 行
    Header(Header<'a>),
    /// 多行 SQL 的续行
    Fragment(&'a str),
    /// 服务器横幅、端口行、列标题等固定样板行
    Ignorable,
    /// 空行或只有空白的行
    Blank,
}

/// 边界行中提取出的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header<'a> {
    /// 原始时间戳文本（`YYMMDD H:MM:SS`），只有首列带时间的行才有
    pub timestamp: Option<&'a str>,
    /// 连接 ID
    pub conn_id: ConnId,
    /// 连接 ID 之后的剩余文本（命令关键字 + 参数）
    pub remainder: &'a str,
}

/// 边界行剩余文本解析出的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<'a> {
    /// `Connect user@host on db`
    Connect(&'a str),
    /// `Query <sql>`
    Query(&'a str),
    /// `Prepare <sql>`
    Prepare(&'a str),
    /// `Execute <sql>`
    Execute(&'a str),
    /// `Quit`
    Quit,
    /// `Init DB <db>`
    InitDb(&'a str),
    /// `Refresh`
    Refresh,
    /// `Close stmt`
    CloseStmt,
    /// 其他已知但不参与统计的服务器命令（Ping、Field List 等）
    Ignored(&'static str),
    /// 无法识别的命令
    Unknown,
}

impl<'a> Action<'a> {
    /// 打开语句捕获的命令（Query、Execute、Prepare）返回其 SQL 正文
    pub fn capture_text(&self) -> Option<&'a str> {
        match self {
            Action::Query(body) | Action::Execute(body) | Action::Prepare(body) => {
                Some(body)
            }
            _ => None,
        }
    }

    /// 命令是否会打开一条语句捕获
    pub fn opens_capture(&self) -> bool {
        self.capture_text().is_some()
    }

    /// 命令名，用于诊断输出
    pub fn name(&self) -> &'static str {
        match self {
            Action::Connect(_) => "Connect",
            Action::Query(_) => "Query",
            Action::Prepare(_) => "Prepare",
            Action::Execute(_) => "Execute",
            Action::Quit => "Quit",
            Action::InitDb(_) => "Init DB",
            Action::Refresh => "Refresh",
            Action::CloseStmt => "Close stmt",
            Action::Ignored(name) => name,
            Action::Unknown => "?",
        }
    }
}

/// `Connect` 行参数中解析出的会话信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    /// `name@host` 形式的用户
    pub user: String,
    /// 连接时选择的数据库
    pub database: Option<String>,
}

/// 正在捕获中的（可能跨多行的）SQL 语句
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStatement {
    /// 打开捕获的行号
    pub line: usize,
    /// 已拼接的 SQL 文本
    pub text: String,
    /// 捕获打开时该连接所属的用户
    pub user: String,
    /// 是否来自 `Prepare` 命令
    pub is_prepare: bool,
}
