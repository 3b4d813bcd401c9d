//! 命令行参数解析与运行流程

use anyhow::{Result, bail};
use genlog_analysis::{
    Analyzer, AnalyzerError, Config, WriterSink, genlog::io::open_input,
};
use std::io::{self, Write};
use std::path::PathBuf;

pub const USAGE: &str = "\
用法: genlog-cli [选项] [LOGFILE]

不指定 LOGFILE 或为 \"-\" 时从标准输入读取。

选项:
  -v, --verbose            输出全部诊断（包括提示级别）
  -c, --coarse             粗粒度报告，不聚类
  --breakoff=YYYY-MM-DD    处理到该日期为止
  --threshold=F            聚类阈值（默认 0.15）
  --config=PATH            TOML 配置文件
  --format=text|json       报告格式
  --log-level=LEVEL        日志级别 (trace/debug/info/warn/error)
  --no-log                 关闭日志输出
  -h, --help               显示帮助";

/// 报告输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    #[cfg(feature = "json")]
    Json,
}

/// 命令行参数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub input: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub coarse: bool,
    pub breakoff: Option<String>,
    pub threshold: Option<f64>,
    pub format: OutputFormat,
    pub log_level: Option<String>,
    pub no_log: bool,
    pub help: bool,
}

impl CliArgs {
    /// 解析命令行参数（不含程序名）
    pub fn from_args<I: Iterator<Item = String>>(args: I) -> Result<Self> {
        let mut cli = Self::default();
        for arg in args {
            match arg.as_str() {
                "-v" | "--verbose" => cli.verbose = true,
                "-c" | "--coarse" => cli.coarse = true,
                "--no-log" => cli.no_log = true,
                "-h" | "--help" => cli.help = true,
                "-" => cli.set_input(&arg)?,
                _ => {
                    if let Some(date) = arg.strip_prefix("--breakoff=") {
                        cli.breakoff = Some(date.to_string());
                    } else if let Some(value) = arg.strip_prefix("--threshold=") {
                        let threshold = value.parse::<f64>().map_err(|_| {
                            AnalyzerError::config(format!("无效的聚类阈值: {value}"))
                        })?;
                        cli.threshold = Some(threshold);
                    } else if let Some(path) = arg.strip_prefix("--config=") {
                        cli.config = Some(PathBuf::from(path));
                    } else if let Some(format) = arg.strip_prefix("--format=") {
                        cli.format = parse_format(format)?;
                    } else if let Some(level) = arg.strip_prefix("--log-level=") {
                        cli.log_level = Some(level.to_lowercase());
                    } else if arg.starts_with('-') {
                        bail!("未知选项: {arg}\n\n{USAGE}");
                    } else {
                        cli.set_input(&arg)?;
                    }
                }
            }
        }
        Ok(cli)
    }

    fn set_input(&mut self, arg: &str) -> Result<()> {
        if self.input.is_some() {
            bail!("只能指定一个日志文件: {arg}");
        }
        self.input = Some(PathBuf::from(arg));
        Ok(())
    }

    /// 读取配置文件并用命令行参数覆盖
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if self.verbose {
            config.analysis.verbose = true;
        }
        if self.coarse {
            config.analysis.coarse = true;
        }
        if let Some(date) = &self.breakoff {
            config.analysis.breakoff = Some(date.clone());
        }
        if let Some(threshold) = self.threshold {
            config.analysis.threshold = threshold;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if self.no_log {
            config.log.enabled = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    match value {
        "text" => Ok(OutputFormat::Text),
        #[cfg(feature = "json")]
        "json" => Ok(OutputFormat::Json),
        #[cfg(not(feature = "json"))]
        "json" => bail!("JSON 报告需要启用 json 特性"),
        _ => bail!("未知的报告格式: {value}"),
    }
}

/// 执行一次完整的分析：读取日志、输出诊断与报告
pub fn run(args: &CliArgs) -> Result<()> {
    let config = args.load_config()?;

    #[cfg(feature = "logging")]
    let _guard = if config.log.enabled {
        genlog_analysis::logging::init_logging((&config.log).into())?
    } else {
        None
    };

    let input = open_input(args.input.as_deref())?;
    let sink = WriterSink::stderr(config.analysis.verbose);
    let mut analyzer = Analyzer::new(&config.analysis, sink)?;
    let summary = analyzer.run(input)?;
    let counts = analyzer.diagnostic_counts().clone();
    let (report, _) = analyzer.finish()?;

    let mut stdout = io::stdout().lock();
    match args.format {
        OutputFormat::Text => report.render(&mut stdout)?,
        #[cfg(feature = "json")]
        OutputFormat::Json => writeln!(stdout, "{}", report.to_json()?)?,
    }
    stdout.flush()?;

    tracing::info!(
        lines = summary.lines,
        halted = summary.halted,
        users = report.users.len(),
        warnings = counts.warnings(),
        "分析完成"
    );
    Ok(())
}
