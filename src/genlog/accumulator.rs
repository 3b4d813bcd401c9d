//! 语句累加器 - 单槽位的多行 SQL 缓冲
//!
//! 同一时刻最多只有一条语句处于捕获状态。边界行到来时先 `flush` 上一条，
//! 再根据边界行的命令决定是否 `open` 新的一条；两者之间的续行通过 `append`
//! 以单个空格拼接。

use crate::error::{AnalyzerError, Result};
use crate::genlog::types::PendingStatement;

/// 单槽位语句累加器
#[derive(Debug, Default)]
pub struct StatementAccumulator {
    pending: Option<PendingStatement>,
}

impl StatementAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前是否有语句在捕获中
    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// 正在捕获的语句（只读）
    pub fn pending(&self) -> Option<&PendingStatement> {
        self.pending.as_ref()
    }

    /// 打开一条新的捕获。
    ///
    /// # Errors
    /// 已有语句在捕获中时返回 [`AnalyzerError::Invariant`]：调用方必须先 `flush`。
    pub fn open(
        &mut self,
        line: usize,
        text: &str,
        user: &str,
        is_prepare: bool,
    ) -> Result<()> {
        if let Some(existing) = &self.pending {
            return Err(AnalyzerError::invariant(
                line,
                format!(
                    "语句累加器已处于打开状态 (第{}行打开, 用户 {})",
                    existing.line, existing.user
                ),
            ));
        }
        tracing::trace!(line, user, is_prepare, "打开语句捕获");
        self.pending = Some(PendingStatement {
            line,
            text: text.trim().to_string(),
            user: user.to_string(),
            is_prepare,
        });
        Ok(())
    }

    /// 追加一行续行；没有打开的捕获时返回 `false`，由调用方报告
    pub fn append(&mut self, fragment: &str) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return true;
        }
        if !pending.text.is_empty() {
            pending.text.push(' ');
        }
        pending.text.push_str(fragment);
        true
    }

    /// 取出已捕获的语句并复位；未打开时返回 `None`
    pub fn flush(&mut self) -> Option<PendingStatement> {
        self.pending.take()
    }
}
