//! # parse 子命令 CLI 定义
//!
//! 选择后端、发现帧来源、指定输出格式与内容。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/parse.rs`

use crate::writers::{OutputFormat, WriteOptions, DEFAULT_LMDB_MAP_SIZE};

use clap::Args;
use std::path::PathBuf;

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Backend name (see `dftio list`)
    #[arg(short, long)]
    pub mode: String,

    /// Directory searched for `*<prefix>*` frame sources
    #[arg(short, long, required_unless_present = "sources")]
    pub root: Option<PathBuf>,

    /// Explicit frame source, used verbatim (repeatable, replaces --root)
    #[arg(long = "source", conflicts_with = "root")]
    pub sources: Vec<PathBuf>,

    /// Substring that discovered sources must contain
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Output root directory
    #[arg(short, long)]
    pub outroot: PathBuf,

    /// Output format: hdf5, dat, ase or lmdb
    #[arg(short, long, default_value = "dat", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Write band energies and k-points
    #[arg(long, default_value_t = false)]
    pub eigenvalue: bool,

    /// Write Hamiltonian blocks
    #[arg(long, default_value_t = false)]
    pub hamiltonian: bool,

    /// Write overlap blocks
    #[arg(long, default_value_t = false)]
    pub overlap: bool,

    /// Write density-matrix blocks
    #[arg(long, default_value_t = false)]
    pub density_matrix: bool,

    /// Drop bands below this index
    #[arg(long, default_value_t = 0)]
    pub band_index_min: usize,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0, env = "DFTIO_JOBS")]
    pub jobs: usize,

    /// LMDB map size in bytes
    #[arg(long, default_value_t = DEFAULT_LMDB_MAP_SIZE, env = "DFTIO_LMDB_MAP_SIZE")]
    pub lmdb_map_size: usize,

    /// Write a CSV manifest (idx,source,status,message)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

impl ParseArgs {
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            format: self.format,
            eigenvalue: self.eigenvalue,
            hamiltonian: self.hamiltonian,
            overlap: self.overlap,
            density_matrix: self.density_matrix,
            band_index_min: self.band_index_min,
            lmdb_map_size: self.lmdb_map_size,
        }
    }
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}
