//! # 后端注册表
//!
//! 名称 → 构造函数的显式映射。内置后端由 [`ParserRegistry::with_defaults`] 注册，
//! 外部后端通过 [`ParserRegistry::register`] 加入。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `parsers/vasp/`

use super::vasp::VaspParser;
use super::{Parser, Root, Sources};
use crate::error::{DftioError, Result};

use std::collections::BTreeMap;

/// 后端构造函数
pub type ParserBuilder = fn(Sources) -> Result<Box<dyn Parser>>;

/// 后端注册表
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    builders: BTreeMap<String, ParserBuilder>,
}

impl ParserRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部内置后端
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .builders
            .insert(VaspParser::NAME.to_string(), VaspParser::build);
        registry
    }

    /// 注册后端，名称重复时报错
    pub fn register(&mut self, name: &str, builder: ParserBuilder) -> Result<()> {
        if self.builders.contains_key(name) {
            return Err(DftioError::DuplicateParser(name.to_string()));
        }
        self.builders.insert(name.to_string(), builder);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// 已注册名称（有序）
    pub fn names(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }

    /// 发现帧来源并构造后端
    pub fn build(&self, name: &str, root: Root, prefix: &str) -> Result<Box<dyn Parser>> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| DftioError::UnsupportedParser {
                name: name.to_string(),
                available: self.names().join(", "),
            })?;
        builder(Sources::discover(root, prefix)?)
    }
}
