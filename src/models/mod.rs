//! # 数据模型模块
//!
//! 定义通用的原子结构对象与元素周期表。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `writers/` 使用
//! - 子模块: structure, elements

pub mod elements;
pub mod structure;

pub use structure::{hill_formula, Atoms, Lattice};
