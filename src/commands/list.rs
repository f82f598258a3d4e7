//! # list 命令实现
//!
//! 以表格列出已注册后端与支持的输出格式。
//!
//! ## 依赖关系
//! - 使用 `parsers/registry.rs`, `writers/mod.rs`
//! - 使用 `tabled` 显示表格

use crate::error::Result;
use crate::parsers::ParserRegistry;
use crate::utils::output;
use crate::writers::OutputFormat;

use tabled::{Table, Tabled};

#[derive(Debug, Clone, Tabled)]
struct BackendRow {
    #[tabled(rename = "Backend")]
    name: String,
}

#[derive(Debug, Clone, Tabled)]
struct FormatRow {
    #[tabled(rename = "Format")]
    name: &'static str,
    #[tabled(rename = "Layout")]
    layout: &'static str,
}

/// 执行 list 命令
pub fn execute() -> Result<()> {
    let registry = ParserRegistry::with_defaults();

    output::print_header("Registered backends");
    println!("{}", Table::new(backend_rows(&registry)));

    output::print_header("Output formats");
    println!("{}", Table::new(format_rows()));
    Ok(())
}

fn backend_rows(registry: &ParserRegistry) -> Vec<BackendRow> {
    registry
        .names()
        .into_iter()
        .map(|name| BackendRow {
            name: name.to_string(),
        })
        .collect()
}

fn format_rows() -> Vec<FormatRow> {
    OutputFormat::ALL
        .iter()
        .map(|format| FormatRow {
            name: format.as_str(),
            layout: match format {
                OutputFormat::Hdf5 | OutputFormat::Dat => "<formula>.<idx>/ text + npy + h5",
                OutputFormat::Ase => "<formula>.<idx>/xdat.xyz + npy + h5",
                OutputFormat::Lmdb => "data.<pid>.lmdb",
            },
        })
        .collect()
}
