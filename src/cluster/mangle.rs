//! 字面量遮蔽
//!
//! 把语句里的常量（十六进制串、密码哈希、日期、IP、数字、id 列表等）替换为
//! 占位符 `?`，使只在字面量上不同的语句在编辑距离上足够接近。规则是近似的，
//! 可按数据集追加列名规则。
//!
//! 每条规则反复应用直到不再匹配；整组规则再反复执行直到一整轮没有任何替换，
//! 因此对已遮蔽的文本再次遮蔽不会改变结果。

use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

/// 字面量占位符
pub const PLACEHOLDER: &str = "?";

/// 整组规则的最大轮数
const MAX_PASSES: usize = 8;

lazy_static! {
    /// 内置规则（名称, 模式, 替换），顺序有意义：先具体后宽泛
    static ref BUILTIN_RULES: Vec<MaskRule> = vec![
        MaskRule::builtin("hex_blob", r"(?i)\b0x[0-9a-f]+\b|\bx'[0-9a-f]*'", "?"),
        MaskRule::builtin(
            "password_fn",
            r"(?i)\bPASSWORD\s*\(\s*'[^']*'\s*\)",
            "PASSWORD(?)",
        ),
        MaskRule::builtin("password_hash", r"(?i)'\*[0-9a-f]{40}'", "?"),
        MaskRule::builtin(
            "datetime",
            r"'\d{4}-\d{2}-\d{2}[ T]\d{2}:\d{2}:\d{2}(?:\.\d+)?'",
            "?",
        ),
        MaskRule::builtin("date", r"'\d{4}-\d{2}-\d{2}'", "?"),
        MaskRule::builtin("ipv4_quoted", r"'\d{1,3}(?:\.\d{1,3}){3}'", "?"),
        MaskRule::builtin("ipv4", r"\b\d{1,3}(?:\.\d{1,3}){3}\b", "?"),
        MaskRule::builtin(
            "string_assignment",
            r"(?i)(\b[a-z_][a-z0-9_$]*(?:\.[a-z_][a-z0-9_$]*)?\s*(?:=|<>|!=|<=|>=|<|>|\bLIKE\b)\s*)'(?:[^'\\]|\\.)*'",
            "${1}?",
        ),
        MaskRule::builtin("quoted_number", r"'\d+(?:\.\d+)?'", "?"),
        MaskRule::builtin("number", r"\b\d+(?:\.\d+)?\b", "?"),
        MaskRule::builtin("id_list", r"\(\s*\?(?:\s*,\s*\?)+\s*\)", "(?)"),
        MaskRule::builtin(
            "values_rows",
            r"(?i)\bVALUES\s*\(\?\)(?:\s*,\s*\(\?\))+",
            "VALUES (?)",
        ),
    ];
}

/// 单条遮蔽规则
#[derive(Debug, Clone)]
pub struct MaskRule {
    name: String,
    re: Regex,
    replacement: String,
}

impl MaskRule {
    fn builtin(name: &str, pattern: &str, replacement: &str) -> Self {
        Self {
            name: name.to_string(),
            re: Regex::new(pattern).unwrap(),
            replacement: replacement.to_string(),
        }
    }

    /// 针对指定列名的赋值规则：`COL = <字面量>` → `COL = ?`
    pub fn column(column: &str) -> Result<Self> {
        let pattern = format!(
            r#"(?i)(\b{}\s*=\s*)(?:'(?:[^'\\]|\\.)*'|"[^"]*"|-?\d+(?:\.\d+)?)"#,
            regex::escape(column)
        );
        Ok(Self {
            name: format!("column:{column}"),
            re: Regex::new(&pattern)?,
            replacement: "${1}?".to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 反复应用直到不再匹配，返回是否有替换
    fn apply(&self, text: &mut String) -> bool {
        let mut changed = false;
        loop {
            let next = match self.re.replace_all(text, self.replacement.as_str()) {
                Cow::Borrowed(_) => break,
                Cow::Owned(next) => next,
            };
            if next == *text {
                break;
            }
            *text = next;
            changed = true;
        }
        changed
    }
}

/// 字面量遮蔽器
#[derive(Debug, Clone)]
pub struct Mangler {
    rules: Vec<MaskRule>,
}

impl Default for Mangler {
    fn default() -> Self {
        Self::new()
    }
}

impl Mangler {
    /// 使用内置规则创建
    pub fn new() -> Self {
        Self { rules: BUILTIN_RULES.clone() }
    }

    /// 内置规则之外，追加指定列名的赋值规则（先于内置规则执行）
    pub fn with_columns<S: AsRef<str>>(columns: &[S]) -> Result<Self> {
        let mut rules = columns
            .iter()
            .map(|c| MaskRule::column(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        rules.extend(BUILTIN_RULES.iter().cloned());
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[MaskRule] {
        &self.rules
    }

    /// 遮蔽语句中的字面量
    #[must_use]
    pub fn mangle(&self, text: &str) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_PASSES {
            let mut changed = false;
            for rule in &self.rules {
                if rule.apply(&mut current) {
                    tracing::trace!(rule = rule.name(), "遮蔽规则命中");
                    changed = true;
                }
            }
            if !changed {
                return current;
            }
        }
        tracing::debug!("遮蔽未在 {} 轮内收敛: {}", MAX_PASSES, current);
        current
    }
}
