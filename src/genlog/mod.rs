//! MySQL general query log 行级解析模块
//!
//! 提供行分类、语句累加、输入读取和工具函数

pub mod accumulator;
pub mod io;
pub mod line;
pub mod types;
pub mod utils;

// 重新导出核心类型和函数
pub use accumulator::StatementAccumulator;
pub use line::{classify, is_boilerplate};
pub use types::{Action, ConnId, ConnectInfo, Header, LogLine, PendingStatement};
pub use utils::{expand_tabs, parse_breakoff, parse_timestamp};
