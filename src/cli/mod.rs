//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `parse`: 用指定后端读取全部帧并写出
//! - `list`: 列出已注册后端与输出格式
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: parse

pub mod parse;

use clap::{ArgAction, Parser, Subcommand};

/// dftio - DFT 输出规范化工具
#[derive(Parser, Debug)]
#[command(name = "dftio")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Normalize DFT calculation outputs into atomic-graph datasets", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse every frame found by a backend and write it out
    Parse(parse::ParseArgs),

    /// List registered backends and output formats
    List,
}
