//! # 批量处理模块
//!
//! 对一个后端的全部下标并行写出，收集逐帧结果。
//!
//! ## 依赖关系
//! - 被 `commands/parse.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod runner;

pub use runner::{BatchResult, BatchRunner, ManifestRow, ProcessResult};
