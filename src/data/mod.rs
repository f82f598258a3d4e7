//! # 数据模型模块
//!
//! 记录（字段名 → 带类型数组）及其派生几何量。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `writers/` 使用
//! - 子模块: keys, field, graph, batch

pub mod batch;
pub mod field;
pub mod graph;
pub mod keys;

pub use field::{DType, Field};

use crate::error::{DftioError, Result};
use std::collections::BTreeMap;

/// 记录：字段名到数组的映射
pub type Record = BTreeMap<String, Field>;

/// 单帧的块字典，键为 `i_j_Rx_Ry_Rz`
pub type BlockFrame = BTreeMap<String, Field>;

/// 按帧排列的块记录
pub type Blocks = Vec<BlockFrame>;

/// 取出必需字段，缺失时报告字段名
pub fn must_have<'a>(record: &'a Record, key: &str) -> Result<&'a Field> {
    record.get(key).ok_or_else(|| DftioError::missing(key))
}
