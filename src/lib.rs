//! # dftio - DFT 输出规范化库
//!
//! 把不同 DFT 程序的输出读成统一的原子图记录，并写出为下游机器学习使用的
//! 数据集格式。
//!
//! ## 模块
//! - `data` - 字段名注册表、周期图数据模型、批处理
//! - `parsers` - 后端契约、校验、注册表与各程序后端
//! - `writers` - hdf5 / dat / ase / lmdb 写出器
//! - `models` - 原子结构与元素表
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── data/      (记录、字段、图、批处理)
//!   ├── parsers/   (Parser 契约、校验、注册表、vasp)
//!   │     └── models/ (Atoms、元素)
//!   ├── writers/   (目录布局、h5、lmdb)
//!   ├── batch/     (并行写出)
//!   ├── cli/ + commands/ (命令行)
//!   ├── utils/     (输出、日志、进度条)
//!   └── error.rs   (错误处理)
//! ```

pub mod batch;
pub mod cli;
pub mod commands;
pub mod data;
pub mod error;
pub mod models;
pub mod parsers;
pub mod utils;
pub mod writers;

pub use data::{DType, Field, Record};
pub use error::{DftioError, Result};
pub use parsers::{BlockRequest, BlockSet, Parser, ParserRegistry, Root, Sources};
pub use writers::{OutputFormat, WriteOptions};
