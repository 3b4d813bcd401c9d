//! 模板聚类
//!
//! 每个用户维护一组模板（遮蔽后的语句 + 出现次数），按出现次数降序排列。
//! 新语句依次与模板比较归一化编辑距离，第一个严格低于阈值的模板即视为命中；
//! 这是首个命中而非最佳命中，报告形态依赖这一点。

use crate::cluster::mangle::Mangler;
use serde::Serialize;

/// 默认聚类阈值
pub const DEFAULT_THRESHOLD: f64 = 0.15;

/// 一个聚类模板
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    /// 代表文本（遮蔽后的语句）
    pub text: String,
    /// 出现次数
    pub count: u64,
    #[serde(skip)]
    chars: usize,
}

impl Template {
    fn new(text: &str) -> Self {
        Self { text: text.to_string(), count: 1, chars: text.chars().count() }
    }
}

/// 语句被分配到的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// 命中已有模板，值为命中后该模板的出现次数
    Matched(u64),
    /// 新建模板
    Created,
}

/// 归一化编辑距离：`d / ((len(a) + len(b)) / 2)`，长度按字符计
#[must_use]
pub fn normalized_distance(a: &str, b: &str) -> f64 {
    let mean = (a.chars().count() + b.chars().count()) as f64 / 2.0;
    if mean == 0.0 {
        return 0.0;
    }
    strsim::levenshtein(a, b) as f64 / mean
}

/// 单个用户的模板集合，始终按出现次数降序，次数相同保持先后顺序
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将遮蔽后的语句分配到模板
    pub fn assign(&mut self, mangled: &str, threshold: f64) -> Assignment {
        let len = mangled.chars().count();
        let hit = self.templates.iter().position(|t| {
            let mean = (len + t.chars) as f64 / 2.0;
            if mean == 0.0 {
                return threshold > 0.0;
            }
            // 长度差是编辑距离的下界，下界已不满足时无需计算
            if len.abs_diff(t.chars) as f64 / mean >= threshold {
                return false;
            }
            (strsim::levenshtein(mangled, &t.text) as f64 / mean) < threshold
        });

        match hit {
            Some(index) => Assignment::Matched(self.bump(index)),
            None => {
                self.templates.push(Template::new(mangled));
                Assignment::Created
            }
        }
    }

    /// 计数加一并上浮，保持降序
    fn bump(&mut self, mut index: usize) -> u64 {
        self.templates[index].count += 1;
        let count = self.templates[index].count;
        while index > 0 && self.templates[index - 1].count < count {
            self.templates.swap(index - 1, index);
            index -= 1;
        }
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// 聚类引擎：遮蔽 + 阈值
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    mangler: Mangler,
    threshold: f64,
}

impl Default for ClusterEngine {
    fn default() -> Self {
        Self::new(Mangler::new(), DEFAULT_THRESHOLD)
    }
}

impl ClusterEngine {
    pub fn new(mangler: Mangler, threshold: f64) -> Self {
        Self { mangler, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn mangler(&self) -> &Mangler {
        &self.mangler
    }

    /// 遮蔽规范化后的语句并分配到用户的模板集合
    pub fn observe(
        &self,
        templates: &mut TemplateSet,
        normalized: &str,
    ) -> Assignment {
        let mangled = self.mangler.mangle(normalized);
        let assignment = templates.assign(&mangled, self.threshold);
        if assignment == Assignment::Created {
            tracing::trace!(templates = templates.len(), "新模板: {}", mangled);
        }
        assignment
    }
}
