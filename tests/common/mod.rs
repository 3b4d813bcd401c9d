//! 集成测试公共模块

use genlog_analysis::{AnalysisConfig, Analyzer, Diagnostic, Report};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

/// 在临时目录中写入日志文件
#[allow(dead_code)]
pub fn create_test_log(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// 一次连接、一条查询、一次断开
#[allow(dead_code)]
pub const SIMPLE_LOG: &str = "\
/usr/sbin/mysqld, Version: 5.6.38-log (MySQL Community Server (GPL)). started with:
Tcp port: 3306  Unix socket: /var/lib/mysql/mysql.sock
Time                 Id Command    Argument
171215 10:00:00\t    5 Connect\tuser1@host on db1
171215 10:00:00\t    5 Query\tSELECT 1
171215 10:00:01\t    5 Quit\t
";

/// 多个用户、多行语句、无关语句、重复模板
#[allow(dead_code)]
pub const MIXED_LOG: &str = "\
171215 10:00:00\t    5 Connect\tapp@web on shop
\t\t    5 Query\tSET NAMES utf8
\t\t    5 Query\tSELECT id, name
\tFROM users
\tWHERE id = 17
\t\t    5 Query\tSELECT id, name FROM users WHERE id = 42
\t\t    5 Query\tSHOW TABLES
171215 10:00:02\t    6 Connect\tbatch@cron on shop
\t\t    6 Query\tUPDATE jobs SET done = 1 WHERE id = 7
\t\t    6 Query\tINSERT INTO audit VALUES (1, 'x')
\t\t    6 Quit\t
\t\t    5 Query\tSELECT id, name FROM users WHERE id = 99
\t\t    5 Quit\t
";

/// 使用内存诊断收集器跑完整个日志
#[allow(dead_code)]
pub fn analyze(content: &str, config: &AnalysisConfig) -> (Report, Vec<Diagnostic>) {
    let mut analyzer = Analyzer::collecting(config).expect("analyzer");
    analyzer.run(Cursor::new(content)).expect("run");
    analyzer.finish().expect("finish")
}

/// 粗粒度配置
#[allow(dead_code)]
pub fn coarse() -> AnalysisConfig {
    AnalysisConfig { coarse: true, ..AnalysisConfig::default() }
}
