//! 语句聚类模块
//!
//! 没有真正的 SQL 解析器时，对只在字面量上不同的语句做近似去重：
//! 先遮蔽字面量，再按归一化编辑距离归入模板。

pub mod engine;
pub mod mangle;

pub use engine::{
    Assignment, ClusterEngine, DEFAULT_THRESHOLD, Template, TemplateSet,
    normalized_distance,
};
pub use mangle::{MaskRule, Mangler, PLACEHOLDER};
