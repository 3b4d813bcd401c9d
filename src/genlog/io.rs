//! 日志输入读取
//!
//! 按字节读取行，遇到无效 UTF-8 时做有损转换并记录告警，保证单个坏字节
//! 不会中断整个流的处理。

use crate::error::Result;
use std::{
    borrow::Cow,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    str,
};

/// 打开输入：`None` 或 `-` 表示标准输入
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p != Path::new("-") => {
            tracing::debug!("打开日志文件: {}", p.display());
            let file = File::open(p)?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => {
            tracing::debug!("从标准输入读取日志");
            Ok(Box::new(BufReader::new(io::stdin())))
        }
    }
}

/// 将读取到的字节转换为字符串，尽可能借用；无效 UTF-8 时有损转换
pub fn line_bytes_to_str(line_bytes: &[u8], line_num: usize) -> Cow<'_, str> {
    match str::from_utf8(line_bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(e) => {
            let prefix_len = 8usize.min(line_bytes.len());
            tracing::warn!(
                line = line_num,
                error = %e,
                "发现无效 UTF-8 字节序列, len={} prefix={:?}",
                line_bytes.len(),
                &line_bytes[..prefix_len]
            );
            String::from_utf8_lossy(line_bytes)
        }
    }
}

/// 逐行读取器，复用内部缓冲区
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    line_num: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, buf: Vec::with_capacity(256), line_num: 0 }
    }

    /// 已读取的行数
    pub fn line_num(&self) -> usize {
        self.line_num
    }

    /// 读取下一行（去掉行尾 CR/LF），到达末尾返回 `None`
    pub fn next_line(&mut self) -> Result<Option<Cow<'_, str>>> {
        self.buf.clear();
        let n = self.inner.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_num += 1;

        let mut end = self.buf.len();
        while end > 0 && matches!(self.buf[end - 1], b'\n' | b'\r') {
            end -= 1;
        }
        Ok(Some(line_bytes_to_str(&self.buf[..end], self.line_num)))
    }
}
